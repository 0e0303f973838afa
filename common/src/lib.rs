//! Menu Lens Common Library
//!
//! CLIと将来のフロントエンドで共有される型・プロンプト・パーサー

pub mod types;
pub mod error;
pub mod parser;
pub mod prompts;

pub use types::{Dish, MenuAnalysisResult, format_yen};
pub use error::{AnalysisError, Result, GENERIC_FAILURE_MESSAGE};
pub use parser::{extract_json_object, parse_menu_response};
pub use prompts::{
    ANALYSIS_INSTRUCTION, CUISINE_SEARCH_TERM, SYSTEM_INSTRUCTION,
    build_dish_image_prompt, build_search_query, response_schema,
};
