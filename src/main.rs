use anyhow::Result;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use lookuply_tui::app::{ApiEvent, App};
use lookuply_tui::config::Config;
use lookuply_tui::tui::{EventHandler, Tui};
use lookuply_tui::{handler, tui, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().unwrap_or_else(|_| Config::new());

    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let mut app = App::new(&config, update_tx);

    handler::spawn_health_probe(app.api.clone(), app.update_tx.clone());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, &mut app, update_rx).await;

    tui::restore()?;
    result
}

async fn run(
    terminal: &mut Tui,
    app: &mut App,
    mut update_rx: UnboundedReceiver<ApiEvent>,
) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            maybe_event = events.next() => {
                match maybe_event {
                    Some(event) => handler::handle_event(app, event),
                    None => break,
                }
            }
            maybe_update = update_rx.recv() => {
                match maybe_update {
                    Some(update) => app.apply_api_event(update),
                    None => break,
                }
            }
        }
    }

    Ok(())
}
