pub mod harness;

mod test_dialogs;
