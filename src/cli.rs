use crate::config::DishImageStrategy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "menu-lens")]
#[command(about = "メニュー写真をAIで翻訳・解説するツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 料理画像の取得方式（設定ファイルより優先）
    #[arg(long, global = true)]
    pub strategy: Option<DishImageStrategy>,
}

/// 解析結果の出力先
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// 店名（画像検索のクエリに含める）
    #[arg(short, long)]
    pub restaurant: Option<String>,

    /// 解析結果JSONの保存先
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 生成した料理画像の保存先ディレクトリ
    #[arg(long)]
    pub image_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// カメラでメニューを撮影して解析
    Capture {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// 画像ファイルを解析
    Analyze {
        /// メニュー画像のパス
        #[arg(required = true)]
        image: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// 設定を表示/編集
    Config {
        /// Gemini APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 画像検索APIキーを設定
        #[arg(long)]
        set_search_key: Option<String>,

        /// 検索エンジンIDを設定
        #[arg(long)]
        set_engine_id: Option<String>,

        /// 料理画像の取得方式を設定
        #[arg(long = "set-strategy")]
        strategy: Option<DishImageStrategy>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
