pub mod console;
pub mod play;
pub mod settings;
pub mod table;
