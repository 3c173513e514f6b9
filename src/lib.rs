pub mod ast;
pub mod builtins;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod object;
pub mod parser;
pub mod repl;
pub mod scanner;
pub mod stack;
pub mod token;
