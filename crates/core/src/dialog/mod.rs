pub mod machine;
pub mod validate;
