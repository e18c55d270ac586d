mod args;
mod surface;

use std::process::ExitCode;

use clap::Parser;

use media::feed::Feed;
use util::stop_signals;

use args::Args;
use surface::StatsSurface;

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = stop_signals::polling::enable() {
        log::error!("Failed to enable stop signal polling: {e}");
        return ExitCode::FAILURE;
    }

    let config = match args.feed_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let feed = match Feed::start(&config) {
        Ok(feed) => feed,
        Err(e) => {
            log::error!("Failed to start the feed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let render_period = args.render_period();
    let mut presenter = feed.presenter();
    let mut surface = StatsSurface::default();

    let exit_code = loop {
        // Doubles as the render tick: this returns after `render_period` unless
        // the poller fails first.
        if let Some(e) = feed.wait_fatal_error(render_period) {
            log::error!("The feed stopped: {e}");
            break ExitCode::FAILURE;
        }

        if stop_signals::polling::consume() {
            log::info!("Stopping.");
            break ExitCode::SUCCESS;
        }

        if presenter.has_pending() {
            presenter.acquire(|view| surface.present(view));
        }
    };

    feed.stop();
    drop(feed);

    log::info!("{surface}.");
    if let Some(mean) = presenter.latency().mean() {
        log::info!("Mean {}: {mean:?}", presenter.latency());
    }

    exit_code
}
