pub mod math;
pub mod rgb;
pub mod config;
pub mod skin_ini;
pub mod chart;
pub mod curve;
pub mod beatmap;
pub mod hit_objects;
pub mod processor;
pub mod session;
pub mod osu_input;
pub mod audio;
pub mod render;
pub mod autoplay;
