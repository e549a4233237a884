//! Builtin widget plugins.
//!
//! Each submodule is one self-contained plugin: a factory carrying its
//! descriptor and an `init` that spawns the backend tasks for one instance.
//! Between them the builtins exercise every harness capability (interval
//! publishing, refresh kicks, state export, external HTTP polling, the
//! per-type secrets gate), so they double as living documentation for
//! out-of-tree plugins.

mod clock;
mod sitemon;
mod stocks;
mod weather;

pub use clock::ClockFactory;
pub use sitemon::SitemonFactory;
pub use stocks::StocksFactory;
pub use weather::WeatherFactory;

use std::sync::Arc;

use crate::registry::WidgetFactory;

/// The builtin widget set, in registration order.
pub fn builtin() -> Vec<Arc<dyn WidgetFactory>> {
    vec![
        Arc::new(ClockFactory::new()),
        Arc::new(WeatherFactory::new()),
        Arc::new(SitemonFactory::new()),
        Arc::new(StocksFactory::new()),
    ]
}
