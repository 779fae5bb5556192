pub mod item_view;

pub use item_view::ItemView;
