//! Command line parameters.

/// Demo parameters (from CLI or defaults).
#[derive(Debug, Clone)]
pub struct DemoParams {
    pub seed: u64,
    /// Load distance in chunks.
    pub load_distance: f32,
    pub ticks: u64,
    /// Save slot written and reloaded at the end of the run.
    pub save: String,
}

impl Default for DemoParams {
    fn default() -> Self {
        Self {
            seed: 12345,
            load_distance: 4.0,
            ticks: 240,
            save: "demo".to_string(),
        }
    }
}

impl DemoParams {
    /// Parse parameters from the process arguments.
    pub fn from_args() -> Self {
        Self::parse(std::env::args().skip(1))
    }

    /// Parse parameters; unknown flags and malformed values are ignored.
    pub fn parse(args: impl IntoIterator<Item = String>) -> Self {
        let mut params = Self::default();
        let args: Vec<String> = args.into_iter().collect();

        let mut i = 0;
        while i < args.len() {
            let value = args.get(i + 1);
            match (args[i].as_str(), value) {
                ("--seed", Some(v)) => {
                    if let Ok(v) = v.parse() {
                        params.seed = v;
                        i += 1;
                    }
                }
                ("--load-distance", Some(v)) => {
                    if let Ok(v) = v.parse::<f32>() {
                        if v > 0.0 {
                            params.load_distance = v;
                        }
                        i += 1;
                    }
                }
                ("--ticks", Some(v)) => {
                    if let Ok(v) = v.parse() {
                        params.ticks = v;
                        i += 1;
                    }
                }
                ("--save", Some(v)) => {
                    params.save.clone_from(v);
                    i += 1;
                }
                _ => {}
            }
            i += 1;
        }

        params
    }
}
