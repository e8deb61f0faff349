mod app_state;
mod cli;
mod dialogs;
mod icon;
mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use futures_util::FutureExt;
use jspaint_common::{ForwardedLaunch, LaunchRequest};
use jspaint_config::MediatorConfig;
use jspaint_platform::{Acquired, InstanceCoordinator};
use winit::event_loop::EventLoop;

use app_state::{AppEvent, AppEventSender, JsPaintApp};

/// `JSPAINT_DEBUG=1` or a debug build.
fn is_dev_mode() -> bool {
    cfg!(debug_assertions) || std::env::var("JSPAINT_DEBUG").is_ok_and(|v| v == "1")
}

fn load_config(override_path: Option<&str>) -> MediatorConfig {
    let loaded = match override_path {
        Some(path) => {
            tracing::info!("Using config override: {path}");
            jspaint_config::toml_loader::load_from_path(Path::new(path))
        }
        None => jspaint_config::load_config(),
    };
    loaded.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        MediatorConfig::default()
    })
}

/// Drop the "Edit with JS Paint" registry file next to the installed binary.
#[cfg(windows)]
fn write_file_association() {
    if cfg!(debug_assertions) {
        return;
    }
    let Ok(exe) = std::env::current_exe() else {
        return;
    };
    let Some(dir) = exe.parent() else {
        return;
    };
    match jspaint_platform::file_association::write_registry_file(dir, &exe) {
        Ok(path) => tracing::debug!("Wrote {}", path.display()),
        Err(e) => tracing::warn!("Failed to write file association helper: {e}"),
    }
}

fn main() -> ExitCode {
    jspaint_platform::crash_report::install_panic_hook();

    // --help and --version exit here, before the instance lock is touched.
    let args = cli::parse();

    let log = logging::init(args.log_level.as_deref());
    tracing::info!("JS Paint v{} starting...", env!("CARGO_PKG_VERSION"));
    if args.squirrel_firstrun {
        tracing::debug!("Installer first run");
    }

    let config = load_config(args.config.as_deref());
    log.apply_config_level(config.logging.level.directive());

    if let Err(e) = jspaint_platform::ensure_dirs() {
        tracing::warn!("Failed to create directories: {e}");
    }

    let is_dev = is_dev_mode();
    if is_dev {
        tracing::info!("Dev mode");
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("jspaint-worker")
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    // ===== SINGLE INSTANCE =====

    let cwd = std::env::current_dir().unwrap_or_else(|e| {
        tracing::warn!("Cannot read working directory: {e}");
        PathBuf::new()
    });
    let launch = LaunchRequest::new(args.file_path.as_deref(), &cwd);

    let instance_dir = match jspaint_platform::runtime_dir() {
        Ok(dir) => dir,
        Err(e) => {
            tracing::error!("No directory for the instance lock: {e}");
            return ExitCode::FAILURE;
        }
    };
    let coordinator = InstanceCoordinator::new(config.instance.identity.as_str(), instance_dir)
        .with_retry(config.instance.forward_attempts, config.instance.retry_delay())
        .with_ack_timeout(config.instance.ack_timeout());

    let forwarded = ForwardedLaunch::new(
        std::env::args_os()
            .skip(1)
            .map(|a| a.to_string_lossy().into_owned())
            .collect(),
        &cwd,
    );
    let mut primary = match runtime.block_on(coordinator.acquire(&forwarded)) {
        Ok(Acquired::Primary(primary)) => primary,
        Ok(Acquired::Secondary) => {
            tracing::info!("Handed off to the running instance");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            tracing::error!("Single-instance startup failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    #[cfg(windows)]
    write_file_association();

    // ===== EVENT LOOP =====

    let event_loop = match EventLoop::<AppEvent>::with_user_event().build() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            tracing::error!("Failed to create event loop: {e}");
            return ExitCode::FAILURE;
        }
    };
    let sender = AppEventSender::new(event_loop.create_proxy());

    {
        let _guard = runtime.enter();
        let sender = sender.clone();
        primary.spawn_receiver(move |launch| {
            let (taken, answer) = tokio::sync::oneshot::channel();
            let sent = sender.send(AppEvent::SecondInstance { launch, taken });
            if !sent {
                tracing::debug!("Event loop gone, refusing forwarded launch");
            }
            async move { sent && answer.await.unwrap_or(false) }.boxed()
        });
    }
    app_state::spawn_signal_listener(runtime.handle(), sender.clone());

    let mut app = JsPaintApp::new(config, is_dev, runtime.handle().clone(), sender);
    app.launch(launch.file_path);

    tracing::info!("Entering event loop");
    if let Err(e) = event_loop.run_app(&mut app) {
        tracing::error!("Event loop error: {e}");
        return ExitCode::FAILURE;
    }

    drop(primary);
    runtime.shutdown_timeout(Duration::from_secs(2));
    tracing::info!("Exited");
    app.exit_code()
}
