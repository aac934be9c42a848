mod session;

pub use session::SessionStore;
pub use session::ToggleGuard;
