mod forms;
mod status;

pub use forms::{AddUserForm, ChangePasswordForm, FlashParams};
pub use status::{ServiceState, StatusSnapshot, UserList};
