//! Device command handlers.

use provis_core::{Console, Device, DevicePatch};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

fn detail(d: &Device) -> String {
    [
        format!("ID:       {}", d.id),
        format!("Name:     {}", output::or_dash(d.name.as_deref())),
        format!(
            "Type:     {}",
            d.device_type.map_or_else(|| "-".into(), |t| t.to_string())
        ),
        format!("Serial:   {}", output::or_dash(d.serial_number.as_deref())),
        format!("Asset:    {}", output::or_dash(d.asset_tag.as_deref())),
    ]
    .join("\n")
}

pub async fn handle(
    console: &Console,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::Update {
            device,
            name,
            device_type,
            serial_number,
            asset_tag,
        } => {
            let patch = DevicePatch {
                name,
                device_type: device_type.map(util::device_type),
                serial_number,
                asset_tag,
            };
            let updated = console.update_device(&device, &patch).await?;
            let out = output::render_single(&global.output, &updated, detail, |d| d.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Rename {
            device,
            customer,
            device_type,
        } => {
            let suggestion = console
                .suggest_device_name(&customer, util::device_type(device_type))
                .await?;
            if !util::confirm(
                &format!("Rename device {device} to {}?", suggestion.name),
                global.yes,
            )? {
                return Ok(());
            }
            let renamed = console.accept_device_name(&device, &suggestion).await?;
            if let Some(ref ou) = suggestion.ou {
                util::note(global, &format!("  Join it into {ou}"));
            }
            let out = output::render_single(&global.output, &renamed, detail, |d| {
                d.name.clone().unwrap_or_default()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
