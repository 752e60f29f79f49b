use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use shion_watcher_client::config::Config;
use shion_watcher_client::{DryRunHost, WatcherClient};

#[derive(Parser, Debug)]
#[command(name = "shion-watcher")]
#[command(about = "Клиент плагина shion-watcher: программы, активные окна и управление наблюдением")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "shion.toml")]
    config: String,

    /// Уровень логирования (перекрывает конфигурацию)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Список программ, известных хосту
    List,
    /// Метаданные программы по пути
    Get { path: String },
    /// Приостановить наблюдение
    Suspend,
    /// Возобновить наблюдение
    Resume,
    /// Активна ли программа
    IsActive { path: String },
    /// Включено ли наблюдение
    CheckWatched,
    /// Подписаться на события хоста
    Watch {
        /// Остановиться после N событий
        #[arg(long)]
        events: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации
    let config = Config::load(&args.config)?.with_log_level(args.log_level)?;

    // Инициализация системы логирования
    init_tracing(&config.logging.level, &config.logging.format)?;

    info!("Запуск shion-watcher v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);
    warn!("Хост работает в режиме эмуляции - реальное наблюдение за окнами отключено");

    let host = Arc::new(DryRunHost::from_config(&config));
    let client = WatcherClient::new(host.clone()).with_capabilities(config.capabilities()?);

    match args.action {
        Action::List => print_json(&client.get_program_list().await?)?,
        Action::Get { path } => print_json(&client.get_program_by_path(&path).await?)?,
        Action::Suspend => client.suspend().await?,
        Action::Resume => client.resume().await?,
        Action::IsActive { path } => print_json(&client.is_active(&path).await?)?,
        Action::CheckWatched => print_json(&client.check_watched().await?)?,
        Action::Watch { events } => watch(&client, host, &config, events).await?,
    }

    Ok(())
}

async fn watch(
    client: &WatcherClient,
    host: Arc<DryRunHost>,
    config: &Config,
    limit: Option<usize>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let status_tx = tx.clone();
    let on_status = client
        .on_status_changed(move |status| {
            let _ = status_tx.send(format!("status-changed: {}", status));
        })
        .await?;
    let on_activate = client
        .on_window_activate(move |path| {
            let _ = tx.send(format!("window-activate: {}", path));
        })
        .await?;

    let mut emulation = tokio::spawn(host.run_emulation(config.activation_interval(), None));
    info!("Подписки активны, ожидаем события");

    let mut received = 0;
    loop {
        tokio::select! {
            line = rx.recv() => match line {
                Some(line) => {
                    println!("{}", line);
                    received += 1;
                    if limit.is_some_and(|limit| received >= limit) {
                        break;
                    }
                }
                None => break,
            },
            finished = &mut emulation => {
                match finished {
                    Ok(Ok(())) => info!("Эмуляция хоста завершилась"),
                    Ok(Err(e)) => error!("Ошибка в эмуляции хоста: {}", e),
                    Err(e) => error!("Задача эмуляции хоста упала: {}", e),
                }
                break;
            }
            result = signal::ctrl_c() => {
                match result {
                    Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
                    Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
                }
                break;
            }
        }
    }

    on_status.unlisten();
    on_activate.unlisten();
    emulation.abort();

    info!("Наблюдение завершено, получено событий: {}", received);
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        "pretty" => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .init(),
        _ => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init(),
    }

    Ok(())
}
