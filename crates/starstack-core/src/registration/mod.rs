pub mod stars;
pub mod template;

pub use stars::{
    refine_star, refine_stars, rotate_list, rotation_between, shift_between, AngleEstimate,
    ShiftEstimate, Star, StarList, StarMatchConfig,
};
pub use template::{MatchResult, TemplateConfig, TemplateMatcher};
