//! Widgets command implementation

use crate::cli::output::{format_widgets_json, format_widgets_table, WidgetTypeView};
use crate::cli::WidgetsArgs;
use crate::registry::WidgetRegistry;
use crate::secrets::SecretStore;

/// Handle `tessera widgets` command.
///
/// The secrets store is optional: without one the secrets column shows
/// schema-declared buckets as missing rather than failing the listing.
pub fn handle_widgets(
    args: &WidgetsArgs,
    registry: &WidgetRegistry,
    secrets: Option<&SecretStore>,
) -> Result<String, Box<dyn std::error::Error>> {
    let views: Vec<WidgetTypeView> = registry
        .descriptors()
        .iter()
        .map(|descriptor| {
            let has_secrets = secrets
                .map(|store| store.has_secrets(&descriptor.id))
                .unwrap_or(false);
            WidgetTypeView::new(descriptor, has_secrets)
        })
        .collect();

    if args.json {
        Ok(format_widgets_json(&views))
    } else {
        Ok(format_widgets_table(&views))
    }
}
