use std::fmt;

/// Stages of the installer wizard, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Welcome,
    DiskSelection,
    UserConfiguration,
    AdvancedOptions,
    Summary,
    Installing,
}

/// A requested move through the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Forward,
    Back,
    /// Summary -> Installing, only after the destructive-action warning was acknowledged
    Confirm,
}

impl Step {
    pub const ALL: [Step; 6] = [
        Step::Welcome,
        Step::DiskSelection,
        Step::UserConfiguration,
        Step::AdvancedOptions,
        Step::Summary,
        Step::Installing,
    ];

    /// The transition table. Anything not listed is rejected.
    pub fn transition(self, nav: Nav) -> Option<Step> {
        use Step::*;

        match (self, nav) {
            (Welcome, Nav::Forward) => Some(DiskSelection),
            (DiskSelection, Nav::Forward) => Some(UserConfiguration),
            (UserConfiguration, Nav::Forward) => Some(AdvancedOptions),
            (AdvancedOptions, Nav::Forward) => Some(Summary),

            (DiskSelection, Nav::Back) => Some(Welcome),
            (UserConfiguration, Nav::Back) => Some(DiskSelection),
            (AdvancedOptions, Nav::Back) => Some(UserConfiguration),
            (Summary, Nav::Back) => Some(AdvancedOptions),

            (Summary, Nav::Confirm) => Some(Installing),

            _ => None,
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Step::Welcome => "Welcome",
            Step::DiskSelection => "Disk",
            Step::UserConfiguration => "User",
            Step::AdvancedOptions => "Options",
            Step::Summary => "Summary",
            Step::Installing => "Install",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Step::Welcome => "Welcome",
            Step::DiskSelection => "Disk Selection",
            Step::UserConfiguration => "User Configuration",
            Step::AdvancedOptions => "Advanced Options",
            Step::Summary => "Installation Summary",
            Step::Installing => "Installing",
        }
    }

    /// Position in [`Step::ALL`]
    pub fn ordinal(&self) -> usize {
        Step::ALL.iter().position(|s| s == self).unwrap_or(0)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl fmt::Display for Nav {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Nav::Forward => "forward",
            Nav::Back => "back",
            Nav::Confirm => "to installation",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_walks_the_enumeration_until_summary() {
        let mut step = Step::Welcome;
        let mut seen = vec![step];
        while let Some(next) = step.transition(Nav::Forward) {
            step = next;
            seen.push(step);
        }
        assert_eq!(seen, Step::ALL[..5].to_vec());
    }

    #[test]
    fn back_is_the_inverse_of_forward() {
        for step in &Step::ALL[..4] {
            let next = step.transition(Nav::Forward).expect("forward edge");
            assert_eq!(next.transition(Nav::Back), Some(*step));
        }
    }

    #[test]
    fn only_summary_can_confirm() {
        for step in Step::ALL {
            let expected = (step == Step::Summary).then_some(Step::Installing);
            assert_eq!(step.transition(Nav::Confirm), expected);
        }
    }

    #[test]
    fn installing_has_no_exits() {
        for nav in [Nav::Forward, Nav::Back, Nav::Confirm] {
            assert_eq!(Step::Installing.transition(nav), None);
        }
    }

    #[test]
    fn welcome_has_no_back_edge() {
        assert_eq!(Step::Welcome.transition(Nav::Back), None);
    }
}
