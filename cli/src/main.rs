mod terminal;

use anyhow::Context;
use clap::Parser;
use gui::core::gui::RaceGame;
use plotters::prelude::*;
use racebet::core::competitor::{create_roster, Competitor};
use racebet::core::win_freqs::simulate_win_frequencies;
use racebet::interfaces::cues::{CueSink, SilentCues, TerminalCues};
use racebet::post::race_record::{write_history_csv, RaceRecord};
use racebet::pre::game_opts::GameOpts;
use racebet::pre::read_game_pars::{read_game_pars, GamePars};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;
use terminal::TerminalGame;
use tracing::{info, warn, Level};

fn export_balance_plot(history: &[RaceRecord], starting_balance: u64) -> anyhow::Result<String> {
    let out_dir = std::path::Path::new("output");
    std::fs::create_dir_all(out_dir)?;
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let out_path = out_dir.join(format!("balance_plot_{}.png", ts));

    let mut balances = vec![(0u32, starting_balance as f64)];
    for (i, record) in history.iter().enumerate() {
        balances.push((i as u32 + 1, record.balance_after as f64));
    }
    let y_max = balances.iter().fold(1.0f64, |acc, &(_, b)| acc.max(b)) * 1.1;

    let root = BitMapBackend::new(&out_path, (1280, 720)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Balance after each race", ("sans-serif", 24).into_font())
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0u32..(history.len() as u32).max(1), 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Race")
        .y_desc("Coins")
        .label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 16))
        .draw()?;

    chart.draw_series(LineSeries::new(balances.iter().copied(), &BLUE))?;

    // wins green, losses red
    chart.draw_series(history.iter().enumerate().map(|(i, record)| {
        let color = if record.won { GREEN } else { RED };
        Circle::new(
            (i as u32 + 1, record.balance_after as f64),
            5,
            color.filled(),
        )
    }))?;

    root.present()?;
    Ok(out_path.to_string_lossy().into_owned())
}

fn print_win_frequencies(roster: &[Competitor], win_counts: &[u32], no_sim_runs: u32) {
    println!("RESULT: Wins in {} simulated races", no_sim_runs);
    for (competitor, &wins) in roster.iter().zip(win_counts.iter()) {
        println!(
            "{:<12} {:8} ({:5.1}%)",
            competitor.label(),
            wins,
            wins as f64 / no_sim_runs as f64 * 100.0
        );
    }
}

fn play_in_terminal<C: CueSink>(
    game_opts: &GameOpts,
    game_pars: &GamePars,
    roster: &[Competitor],
    rng: StdRng,
    cues: C,
) -> anyhow::Result<()> {
    let mut game = TerminalGame::new(game_pars, roster, rng, game_opts.realtime_factor, cues);
    let stdin = std::io::stdin();
    game.run(stdin.lock())?;

    let history = game.session.history();
    info!(
        "game over after {} races, balance {}, total winnings {}",
        history.len(),
        game.session.balance(),
        game.session.total_winnings()
    );

    // POST-PROCESSING -----------------------------------------------------------------------------
    if let Some(export_path) = &game_opts.export_history {
        write_history_csv(history, export_path).context(format!(
            "Failed to export race history to {}!",
            export_path.display()
        ))?;
        info!("race history written to {}", export_path.display());
    }

    if game_opts.plot && !history.is_empty() {
        match export_balance_plot(history, game_pars.session_pars.starting_balance) {
            Ok(path) => info!("balance plot written to {}", path),
            Err(e) => warn!("could not write balance plot: {}", e),
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get game options from the command line arguments
    let game_opts: GameOpts = GameOpts::parse();

    tracing_subscriber::fmt()
        .with_max_level(if game_opts.debug {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .init();
    info!("game options: {:?}", game_opts);

    // get game parameters
    let game_pars = if let Some(parfile_path) = &game_opts.parfile_path {
        info!("reading game parameters from {:?}", parfile_path);
        read_game_pars(parfile_path)?
    } else {
        let game_pars = GamePars::default();
        game_pars.validate()?;
        game_pars
    };
    let roster = create_roster(&game_pars.competitors)?;

    if !(game_opts.realtime_factor.is_finite() && game_opts.realtime_factor > 0.0) {
        anyhow::bail!(
            "Real-time factor must be positive, got {}!",
            game_opts.realtime_factor
        );
    }

    let seed = game_opts.seed.unwrap_or_else(rand::random);
    info!("using seed {}", seed);
    let rng = StdRng::seed_from_u64(seed);

    // EXECUTION -----------------------------------------------------------------------------------
    if game_opts.no_sim_runs > 0 {
        // MONTE CARLO CASE - no wagering, only win frequencies
        let t_start = Instant::now();
        let win_counts = simulate_win_frequencies(
            &game_pars.race_pars,
            roster.len(),
            game_opts.no_sim_runs,
            seed,
        )?;
        info!("execution time: {}ms", t_start.elapsed().as_millis());
        print_win_frequencies(&roster, &win_counts, game_opts.no_sim_runs);
    } else if game_opts.gui {
        // GUI CASE - races are animated in a window, the GUI owns the session
        info!("starting GUI...");
        let game = RaceGame::new(&game_pars, roster, rng, game_opts.realtime_factor);
        let native_options = eframe::NativeOptions {
            initial_window_size: Some(eframe::egui::Vec2::new(1280.0, 720.0)),
            ..eframe::NativeOptions::default()
        };
        eframe::run_native(Box::new(game), native_options);
    } else {
        // TERMINAL CASE - cues are only logged in debug mode or rung with --sound
        if game_opts.sound || game_opts.debug {
            let cues = TerminalCues {
                bell: game_opts.sound,
            };
            play_in_terminal(&game_opts, &game_pars, &roster, rng, cues)?;
        } else {
            play_in_terminal(&game_opts, &game_pars, &roster, rng, SilentCues)?;
        }
    }

    Ok(())
}
