pub mod analysis;
pub mod ast;
pub mod codegen;
pub mod compiler;
pub mod dispatch;
pub mod errors;
pub mod loader;
pub mod optimize;
pub mod options;
pub mod symbol_table;
pub mod tir;
pub mod typeinfer;

#[cfg(test)]
mod test_support;
