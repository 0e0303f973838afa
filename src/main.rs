use clap::Parser;
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use menu_lens::acquisition::{open_camera, select_file, CameraConstraints, FfmpegCamera, RawCapture};
use menu_lens::cli::{Cli, Commands, OutputArgs};
use menu_lens::config::{Config, DishImageStrategy};
use menu_lens::error::Result;
use menu_lens::flow::{apply_update, save_generated_image, MenuFlow};
use menu_lens::view::{render_app, render_dish, AppState, MenuApp, ViewTicket};
use menu_lens::logging;
use std::path::Path;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Capture { output } => {
            println!("📷 menu-lens - メニュー撮影\n");
            let config = with_restaurant(load_effective(cli.strategy)?, &output);
            run_capture(&config, &output).await?;
        }

        Commands::Analyze { image, output } => {
            println!("🍽  menu-lens - メニュー解析\n");
            let config = with_restaurant(load_effective(cli.strategy)?, &output);
            let flow = MenuFlow::from_config(&config);
            let mut app = MenuApp::new();

            let capture = select_file(&image).await?;
            show_menu(&flow, &mut app, capture, &output).await?;
        }

        Commands::Config {
            set_api_key,
            set_search_key,
            set_engine_id,
            strategy,
            show,
        } => {
            // 環境変数の値をファイルへ書き戻さない
            let mut config = Config::load_file()?;
            let mut changed = false;

            if let Some(key) = set_api_key {
                config.gemini_api_key = Some(key);
                changed = true;
                println!("✔ Gemini APIキーを設定しました");
            }
            if let Some(key) = set_search_key {
                config.search_api_key = Some(key);
                changed = true;
                println!("✔ 画像検索APIキーを設定しました");
            }
            if let Some(id) = set_engine_id {
                config.search_engine_id = Some(id);
                changed = true;
                println!("✔ 検索エンジンIDを設定しました");
            }
            if let Some(strategy) = strategy {
                config.dish_image_strategy = strategy;
                changed = true;
                println!("✔ 料理画像の取得方式を {} にしました", strategy);
            }

            if changed {
                config.save()?;
            }

            if show || !changed {
                let mut effective = config.clone();
                effective.apply_env();
                println!("設定 ({}):", Config::config_path()?.display());
                for (label, value) in effective.summary() {
                    println!("  {}: {}", label, value);
                }
            }
        }
    }

    Ok(())
}

/// 実行時の設定（ファイル + 環境変数 + `--strategy`）
fn load_effective(strategy: Option<DishImageStrategy>) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(strategy) = strategy {
        config.dish_image_strategy = strategy;
    }
    Ok(config)
}

fn with_restaurant(mut config: Config, output: &OutputArgs) -> Config {
    if let Some(name) = &output.restaurant {
        config.establishment = Some(name.clone());
    }
    config
}

/// 撮影 → 解析 → 表示 を繰り返す
async fn run_capture(config: &Config, output: &OutputArgs) -> Result<()> {
    let flow = MenuFlow::from_config(config);
    let mut app = MenuApp::new();

    loop {
        match acquire(config).await {
            Ok(Some(capture)) => show_menu(&flow, &mut app, capture, output).await?,
            Ok(None) => break,
            Err(e) => {
                log::error!("Acquisition failed: {}", e);
                app.fail(e.to_string());
                print!("{}", render_app(&app));
            }
        }

        let prompt = match app.state() {
            AppState::Results(_) => "別のメニューを撮りますか？",
            _ => "もう一度試しますか？",
        };
        if !Confirm::new().with_prompt(prompt).default(true).interact()? {
            break;
        }
        app.retry();
    }

    Ok(())
}

/// カメラから1枚取り込む（使えなければファイル選択）
///
/// 利用者が中止したら `None`。
async fn acquire(config: &Config) -> Result<Option<RawCapture>> {
    let camera = FfmpegCamera::from_config(&config.camera);
    let constraints = CameraConstraints {
        ideal_width: config.camera.ideal_width,
    };

    let mut session = match open_camera(&camera, constraints).await {
        Ok(session) => session,
        Err(e) => {
            log::warn!("Camera unavailable: {}", e);
            println!("カメラにアクセスできません。画像ファイルを選択してください。");
            return select_file_interactive().await;
        }
    };

    if let Some((width, height)) = session.dimensions() {
        println!(
            "{}カメラ準備完了 ({}x{})",
            if session.is_rear() { "背面" } else { "" },
            width,
            height
        );
    }

    let answer: String = Input::new()
        .with_prompt("Enterで撮影 (q: 終了)")
        .allow_empty(true)
        .interact_text()?;
    if answer.trim().eq_ignore_ascii_case("q") {
        session.close();
        return Ok(None);
    }

    let capture = session.capture().await;
    session.close();
    Ok(Some(capture?))
}

async fn select_file_interactive() -> Result<Option<RawCapture>> {
    let path: String = Input::new()
        .with_prompt("画像ファイルのパス (空欄で終了)")
        .allow_empty(true)
        .interact_text()?;

    let path = path.trim();
    if path.is_empty() {
        return Ok(None);
    }
    select_file(Path::new(path)).await.map(Some)
}

fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// 解析して結果を表示し、料理画像を付ける
async fn show_menu(flow: &MenuFlow, app: &mut MenuApp, capture: RawCapture, output: &OutputArgs) -> Result<()> {
    let progress = spinner("メニューを解析中...");
    let ticket = flow.process(app, capture).await;
    progress.finish_and_clear();

    print!("{}", render_app(app));
    let Some(ticket) = ticket else {
        return Ok(());
    };

    if let (Some(path), Some(view)) = (&output.output, app.results()) {
        let json = serde_json::to_string_pretty(&view.result)?;
        std::fs::write(path, json)?;
        println!("\n✔ 結果を保存: {}", path.display());
    }

    match flow.strategy() {
        DishImageStrategy::Search => attach_search_images(flow, app, ticket).await,
        DishImageStrategy::Generation => generate_on_request(flow, app, ticket, output.image_dir.as_deref()).await?,
    }
    Ok(())
}

async fn attach_search_images(flow: &MenuFlow, app: &mut MenuApp, ticket: ViewTicket) {
    let Some(dishes) = app.results().map(|view| view.result.dishes.clone()) else {
        return;
    };

    println!("\n料理画像を検索中...");
    let mut rx = flow.spawn_dish_images(ticket, &dishes);
    while let Some(update) = rx.recv().await {
        let index = update.index;
        if apply_update(app, update) {
            if let (Some(dish), Some(view)) = (dishes.get(index), app.results()) {
                print!("{}", render_dish(index, dish, view.image(index)));
            }
        }
    }
}

async fn generate_on_request(
    flow: &MenuFlow,
    app: &mut MenuApp,
    ticket: ViewTicket,
    image_dir: Option<&Path>,
) -> Result<()> {
    loop {
        let Some(mut items) = app
            .results()
            .map(|view| view.result.dishes.iter().map(|d| d.translated_name.clone()).collect::<Vec<_>>())
        else {
            return Ok(());
        };
        items.push("戻る".to_string());

        let selected = Select::new()
            .with_prompt("画像を生成する料理を選んでください")
            .items(&items)
            .default(0)
            .interact_opt()?;

        let index = match selected {
            Some(index) if index + 1 < items.len() => index,
            _ => return Ok(()),
        };

        let progress = spinner("画像を生成中...");
        let image = flow.resolve_one(app, ticket, index).await;
        progress.finish_and_clear();

        if let (Some(image), Some(dir)) = (&image, image_dir) {
            match save_generated_image(image, dir, index) {
                Some(Ok(path)) => println!("✔ 画像を保存: {}", path.display()),
                Some(Err(message)) => println!("✖ {}", message),
                None => {}
            }
        }

        if let Some(view) = app.results() {
            if let Some(dish) = view.result.dishes.get(index) {
                print!("{}", render_dish(index, dish, view.image(index)));
            }
        }
    }
}
