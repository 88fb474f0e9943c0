use crate::imports::*;

/// How a section chooses its aspect from the state of the blocks ahead
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionKind {
    /// Aspect follows the aspect number of the next section
    #[default]
    ValueBased,
    /// Aspect is indexed by the count of free sections ahead
    IndexBased,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionAspect {
    /// Signal aspect number; zero is stop
    pub number: u32,
    /// Speed permitted while this aspect is shown
    pub speed: si::Velocity,
}

impl SectionAspect {
    pub fn new(number: u32, speed: si::Velocity) -> Self {
        Self { number, speed }
    }
}

/// Signaling block
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub previous: Option<usize>,
    pub next: Option<usize>,
    #[serde(default)]
    pub kind: SectionKind,
    pub aspects: Vec<SectionAspect>,
    /// Index into `aspects`
    #[serde(default)]
    pub current_aspect: Option<usize>,
    /// Count of unoccupied sections ahead, `None` when unbounded
    #[serde(default)]
    pub free_sections: Option<usize>,
    /// Invisible sections do not impose a speed limit
    #[serde(default)]
    pub invisible: bool,
    /// Set once a train has stopped at this block's stop point
    #[serde(default)]
    pub train_reached_stop_point: bool,
    /// Indices of trains occupying this block
    #[serde(default)]
    pub trains: Vec<usize>,
}

impl Section {
    pub fn enter(&mut self, train: usize) {
        if !self.trains.contains(&train) {
            self.trains.push(train);
        }
    }

    pub fn leave(&mut self, train: usize) {
        self.trains.retain(|t| *t != train);
    }

    pub fn contains(&self, train: usize) -> bool {
        self.trains.contains(&train)
    }

    pub fn aspect(&self) -> Option<&SectionAspect> {
        self.current_aspect.and_then(|a| self.aspects.get(a))
    }

    /// Speed permitted by the current aspect, unbounded without one
    pub fn speed_limit(&self) -> si::Velocity {
        self.aspect()
            .map(|a| a.speed)
            .unwrap_or(f64::INFINITY * uc::MPS)
    }

    /// True if the current aspect is a stop aspect
    pub fn is_stop(&self) -> bool {
        self.aspect().map(|a| a.number == 0).unwrap_or(false)
    }

    fn zero_aspect(&self) -> Option<usize> {
        match self.kind {
            SectionKind::ValueBased => self
                .aspects
                .iter()
                .enumerate()
                .min_by_key(|(_, a)| a.number)
                .map(|(i, _)| i),
            SectionKind::IndexBased => (!self.aspects.is_empty()).then_some(0),
        }
    }
}

/// Re-evaluates the aspect of section `idx` and then of every section behind it.
pub fn update_section(sections: &mut [Section], idx: usize) {
    let mut cursor = Some(idx);
    // bounded so a malformed cyclic `previous` chain cannot loop forever
    let mut remaining = sections.len();
    while let Some(i) = cursor {
        if remaining == 0 {
            warn!("{}\nsection chain through {} is cyclic", format_dbg!(), idx);
            break;
        }
        remaining -= 1;
        let Some(section) = sections.get(i) else {
            warn!("{}\nsection index {} out of range", format_dbg!(), i);
            break;
        };
        let next = section.next.and_then(|n| sections.get(n));
        let occupied = !section.trains.is_empty();
        let free_sections = if occupied {
            Some(0)
        } else {
            match next {
                Some(next) => next.free_sections.map(|f| f + 1),
                None => None,
            }
        };
        let new_aspect = if occupied {
            section.zero_aspect()
        } else if section.aspects.is_empty() {
            None
        } else {
            let last = section.aspects.len() - 1;
            match section.kind {
                SectionKind::ValueBased => {
                    let ahead = next
                        .and_then(|n| n.aspect())
                        .map(|a| a.number)
                        .unwrap_or(section.aspects[last].number);
                    Some(
                        section
                            .aspects
                            .iter()
                            .position(|a| a.number > ahead)
                            .unwrap_or(last),
                    )
                }
                SectionKind::IndexBased => Some(match free_sections {
                    Some(f) if f < last => f,
                    _ => last,
                }),
            }
        };
        let section = &mut sections[i];
        section.free_sections = free_sections;
        section.current_aspect = new_aspect;
        cursor = section.previous;
    }
}

/// Re-evaluates every section, back to front
pub fn update_all_sections(sections: &mut [Section]) {
    for i in (0..sections.len()).rev() {
        update_section(sections, i);
    }
}
