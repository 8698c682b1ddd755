pub mod console_app;

pub use console_app::ConsoleApp;
