pub mod food_diary;
pub mod notes;
pub mod timezone;
