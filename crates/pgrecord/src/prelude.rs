//! Convenient imports for typical `pgrecord` usage.
//!
//! ```ignore
//! use pgrecord::prelude::*;
//! ```

pub use crate::{
    Collection, Database, DatabaseConfig, Model, ModelMeta, Op, QueryBuilder, RecordError,
    RecordResult, Value,
};
