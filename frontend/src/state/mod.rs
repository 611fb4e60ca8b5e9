pub mod account;
pub mod auth_flow;
pub mod editor;
pub mod entry_form;
pub mod entry_list;
pub mod home;
pub mod navigation;
pub mod notification;
pub mod reducer;
pub mod session_gate;
pub mod store;
pub mod wizard;
