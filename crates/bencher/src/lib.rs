/// A request fixture fed to the benchmarks.
#[derive(Debug, Copy, Clone)]
pub struct Fixture {
    name: &'static str,
    group: FixtureGroup,
    content: &'static [u8],
}

impl Fixture {
    pub const fn new(name: &'static str, group: FixtureGroup, content: &'static [u8]) -> Self {
        Self { name, group, content }
    }

    pub const fn small(name: &'static str, content: &'static [u8]) -> Self {
        Self::new(name, FixtureGroup::Small, content)
    }

    pub const fn large(name: &'static str, content: &'static [u8]) -> Self {
        Self::new(name, FixtureGroup::Large, content)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> FixtureGroup {
        self.group
    }

    pub fn content(&self) -> &'static [u8] {
        self.content
    }

    /// The request cut into `size` byte reads, the way a socket may deliver it.
    pub fn reads(&self, size: usize) -> impl Iterator<Item = &'static [u8]> {
        self.content.chunks(size.max(1))
    }
}

#[derive(Clone, Copy, Debug)]
pub enum FixtureGroup {
    Small,
    Large,
}

pub static GET_SMALL: Fixture = Fixture::small("get_small", include_bytes!("../resources/request/get_small.txt"));
pub static GET_LARGE: Fixture = Fixture::large("get_large", include_bytes!("../resources/request/get_large.txt"));

pub fn fixtures() -> [Fixture; 2] {
    [GET_SMALL, GET_LARGE]
}
