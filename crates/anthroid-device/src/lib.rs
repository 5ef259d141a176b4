//! # anthroid-device
//!
//! Android device control for the Anthroid bridge.
//!
//! Provides:
//! - **Command runner**: shell and program execution with timeouts
//! - **Device operations**: toasts, URLs, app launch, package listing, location, calendar
//! - **Companion bridge**: proxy control through broadcast intents and a result file
//! - **Tool dispatch**: the advertised tool list and typed command dispatch
//! - **Install clicker**: UI-automation loop that confirms APK install dialogs
//!
//! Everything that touches the device goes through [`CommandRunner`], so the
//! [`mock`] implementations can stand in for a real phone in tests.

pub mod android;
pub mod clicker;
pub mod mock;
pub mod proxy;
pub mod runner;
pub mod tools;
pub mod ui;

pub use android::{AndroidBridge, AppFilter};
pub use clicker::{ClickerReport, InstallClicker};
pub use proxy::{ProxyBridge, ProxyRequest, ProxyType};
pub use runner::{CommandOutput, CommandRunner, Invocation, SystemRunner};
pub use tools::{DeviceCommand, DeviceTools};
pub use ui::{UiAutomatorDriver, UiDriver, UiElement, UiTransport};
