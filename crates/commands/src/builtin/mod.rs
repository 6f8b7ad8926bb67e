//! Built-in commands. Each module exposes a pure constructor; the
//! composition root in `registry` collects them.

pub mod help;
pub mod ping;
pub mod qrcode;
pub mod uptime;
