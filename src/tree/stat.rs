use derive_more::Display;

/// What a path resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Stat {
    #[display("directory")]
    Directory,
    #[display("file, {length} bytes")]
    File { length: usize },
}
