//! ブラウザセッション管理
//!
//! ブラウザは最初の利用時に起動し、以降は同じプロセスを使い回す。

mod chromium;

pub use chromium::{BrowserHandle, ChromiumLauncher, ChromiumPage, ChromiumSession, Launch};
