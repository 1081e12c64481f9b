pub mod paging {

    pub const INITIAL_PAGE_SIZE: usize = 30;

    pub const MORE_PAGE_SIZE: usize = 20;
}

pub mod terms {

    pub const SEPARATOR: char = ',';

    /// Replaces whitespace runs inside a single term.
    pub const JOIN: char = '-';
}

pub mod viewport {

    pub const PREFETCH_MARGIN_PX: u32 = 600;

    pub const DEFAULT_GRID_COLUMNS: usize = 5;
}

pub mod variants {

    pub const REVERSE_HOLO_SUFFIX: &str = "-RH";

    pub const PROMO_SUFFIX: &str = "-PB";

    pub const MASTER_BALL_SUFFIX: &str = "-MB";
}

pub mod tags {

    pub const FIRST_EDITION: &str = "1st-edition";

    pub const ENERGY: &str = "energy";
}

pub mod api {

    pub const DEFAULT_ENDPOINT: &str = "https://api.cardgrid.dev/search";

    pub const DEFAULT_IMAGE_BASE_URL: &str = "https://images.cardgrid.dev";

    pub const USER_AGENT: &str = "Cardgrid/0.1";
}
