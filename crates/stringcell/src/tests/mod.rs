mod properties;
mod sharing;
