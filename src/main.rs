//! Demo binary: connect to a nearby thermal printer and print a test page.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use printer_link::core::bluetooth::{BluestPicker, FileConnectionStore, PrinterManager};
use printer_link::{ConnectionStatus, PrinterCommand};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let picker = Arc::new(
        BluestPicker::new()
            .await
            .context("no usable bluetooth adapter")?,
    );
    let store = Arc::new(FileConnectionStore::new(".printer-link"));
    let manager = PrinterManager::new(picker, store);

    // Mirror connection events on stdout.
    let mut events = manager.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            info!("event: {event:?}");
        }
    });

    let resumed = manager.try_resume_session().await?;
    if !resumed {
        info!("No recent session, starting manual discovery");
        manager.connect_manual().await?;
    }

    if manager.status().await != ConnectionStatus::Connected {
        anyhow::bail!("no printer connected");
    }

    let snapshot = manager.snapshot().await;
    info!(
        "Connected to {}",
        snapshot.printer_name.as_deref().unwrap_or("unnamed printer")
    );

    manager
        .send_commands(&[
            PrinterCommand::Init,
            PrinterCommand::AlignCenter,
            PrinterCommand::SizeLarge,
            PrinterCommand::BoldOn,
        ])
        .await?;
    manager.print_receipt("printer-link test page\n").await?;
    manager
        .send_commands(&[
            PrinterCommand::BoldOff,
            PrinterCommand::SizeNormal,
            PrinterCommand::AlignLeft,
            PrinterCommand::Feed(4),
            PrinterCommand::PartialCut,
        ])
        .await?;

    info!("Test page sent");
    manager.disconnect().await;
    Ok(())
}
