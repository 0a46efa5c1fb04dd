pub mod slate;
