pub mod command_reader;
pub mod ledger_writer;
pub mod rule_reader;
pub mod user_reader;
