// 数据库抽象层模块

pub mod factory;
pub mod models;
pub mod sqlite;
pub mod traits;

pub use factory::create_database;
pub use models::*;
pub use traits::Database;
