mod navigation;
#[cfg(feature = "fallback")]
mod scanner;
