//! Score bands, health descriptors and trajectories
//!
//! Global invariants enforced:
//! - Band assignment is monotonic in the score
//! - Thresholds are inclusive lower bounds

/// Performance tier for a 0-100 score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Critical,    // < 40
    Attention,   // 40-60
    Proficiency, // 60-80
    Excellence,  // >= 80
}

impl ScoreBand {
    /// Band for a score under the default 80/60/40 thresholds
    pub fn from_score(score: f64) -> ScoreBand {
        band_for_score(score)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreBand::Critical => "critical",
            ScoreBand::Attention => "attention",
            ScoreBand::Proficiency => "proficiency",
            ScoreBand::Excellence => "excellence",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Critical => "Critical",
            ScoreBand::Attention => "Attention",
            ScoreBand::Proficiency => "Proficiency",
            ScoreBand::Excellence => "Excellence",
        }
    }

    /// Fill color used for markers, bars and tiles
    pub fn color(&self) -> &'static str {
        match self {
            ScoreBand::Critical => "#dc3545",
            ScoreBand::Attention => "#ffc107",
            ScoreBand::Proficiency => "#0d6efd",
            ScoreBand::Excellence => "#28a745",
        }
    }

    /// CSS class carried by tiles and table cells
    pub fn css_class(&self) -> String {
        format!("band-{}", self.as_str())
    }

    /// Parse an IDM `score_band` label (case-insensitive)
    pub fn parse(label: &str) -> Option<ScoreBand> {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" => Some(ScoreBand::Critical),
            "attention" => Some(ScoreBand::Attention),
            "proficiency" => Some(ScoreBand::Proficiency),
            "excellence" => Some(ScoreBand::Excellence),
            _ => None,
        }
    }

    pub const ALL: [ScoreBand; 4] = [
        ScoreBand::Excellence,
        ScoreBand::Proficiency,
        ScoreBand::Attention,
        ScoreBand::Critical,
    ];
}

/// Inclusive lower bounds of the upper three bands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandThresholds {
    pub excellence: f64,
    pub proficiency: f64,
    pub attention: f64,
}

impl Default for BandThresholds {
    fn default() -> Self {
        BandThresholds {
            excellence: 80.0,
            proficiency: 60.0,
            attention: 40.0,
        }
    }
}

impl BandThresholds {
    /// Assign a band; non-finite scores fall into the lowest band
    pub fn classify(&self, score: f64) -> ScoreBand {
        if !score.is_finite() {
            ScoreBand::Critical
        } else if score >= self.excellence {
            ScoreBand::Excellence
        } else if score >= self.proficiency {
            ScoreBand::Proficiency
        } else if score >= self.attention {
            ScoreBand::Attention
        } else {
            ScoreBand::Critical
        }
    }
}

/// Assign a band with the default thresholds
pub fn band_for_score(score: f64) -> ScoreBand {
    BandThresholds::default().classify(score)
}

/// Overall health wording for a 0-100 score
pub fn health_descriptor(score: f64) -> &'static str {
    if score >= 85.0 {
        "Excellent Health"
    } else if score >= 75.0 {
        "Good Health"
    } else if score >= 65.0 {
        "Fair Health"
    } else if score >= 50.0 {
        "Needs Improvement"
    } else {
        "Critical Condition"
    }
}

/// Direction of travel between two assessments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trajectory {
    Improving,
    Flat,
    Declining,
}

impl Trajectory {
    /// More than five points either way counts as movement
    pub fn from_scores(current: f64, previous: Option<f64>) -> Trajectory {
        let Some(previous) = previous.filter(|p| p.is_finite()) else {
            return Trajectory::Flat;
        };
        let delta = current - previous;
        if delta > 5.0 {
            Trajectory::Improving
        } else if delta < -5.0 {
            Trajectory::Declining
        } else {
            Trajectory::Flat
        }
    }

    pub fn parse(label: &str) -> Option<Trajectory> {
        match label.trim().to_ascii_lowercase().as_str() {
            "improving" => Some(Trajectory::Improving),
            "flat" | "stable" => Some(Trajectory::Flat),
            "declining" => Some(Trajectory::Declining),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Trajectory::Improving => "Improving",
            Trajectory::Flat => "Flat",
            Trajectory::Declining => "Declining",
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Trajectory::Improving => "\u{2191}",
            Trajectory::Flat => "\u{2192}",
            Trajectory::Declining => "\u{2193}",
        }
    }
}
