pub mod controls;
pub mod debug;
pub mod editor;
pub mod file_tree;
pub mod picker;
pub mod prompt;
pub mod results_table;
pub mod tabs;
