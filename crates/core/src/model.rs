#![forbid(unsafe_code)]

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    Todo,
    Doing,
    Blocked,
    Done,
    Review,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Doing => "doing",
            Self::Blocked => "blocked",
            Self::Done => "done",
            Self::Review => "review",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "todo" => Some(Self::Todo),
            "doing" => Some(Self::Doing),
            "blocked" => Some(Self::Blocked),
            "done" => Some(Self::Done),
            "review" => Some(Self::Review),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Decision,
    Assumption,
    Fix,
    Blocker,
    Note,
    TestFail,
    TestPass,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Decision => "DECISION",
            Self::Assumption => "ASSUMPTION",
            Self::Fix => "FIX",
            Self::Blocker => "BLOCKER",
            Self::Note => "NOTE",
            Self::TestFail => "TEST_FAIL",
            Self::TestPass => "TEST_PASS",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "DECISION" => Some(Self::Decision),
            "ASSUMPTION" => Some(Self::Assumption),
            "FIX" => Some(Self::Fix),
            "BLOCKER" => Some(Self::Blocker),
            "NOTE" => Some(Self::Note),
            "TEST_FAIL" => Some(Self::TestFail),
            "TEST_PASS" => Some(Self::TestPass),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactKind {
    Diff,
    Snippet,
    Config,
    Fixture,
    TestTrace,
    Log,
    Other,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Diff => "DIFF",
            Self::Snippet => "SNIPPET",
            Self::Config => "CONFIG",
            Self::Fixture => "FIXTURE",
            Self::TestTrace => "TEST_TRACE",
            Self::Log => "LOG",
            Self::Other => "OTHER",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "DIFF" => Some(Self::Diff),
            "SNIPPET" => Some(Self::Snippet),
            "CONFIG" => Some(Self::Config),
            "FIXTURE" => Some(Self::Fixture),
            "TEST_TRACE" => Some(Self::TestTrace),
            "LOG" => Some(Self::Log),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FactScope {
    Repo,
    Service,
    Team,
    Global,
}

impl FactScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Repo => "repo",
            Self::Service => "service",
            Self::Team => "team",
            Self::Global => "global",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "repo" => Some(Self::Repo),
            "service" => Some(Self::Service),
            "team" => Some(Self::Team),
            "global" => Some(Self::Global),
            _ => None,
        }
    }
}

impl Default for FactScope {
    fn default() -> Self {
        Self::Repo
    }
}

/// Reserved relation kinds for the `edges` table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeKind {
    DependsOn,
    RelatesTo,
    Touches,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DependsOn => "depends_on",
            Self::RelatesTo => "relates_to",
            Self::Touches => "touches",
        }
    }
}

/// Where an artifact body came from; stamped into `meta_json.origin.type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OriginType {
    Text,
    Workspace,
    WorkspaceUri,
    Uri,
    Empty,
}

impl OriginType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Workspace => "workspace",
            Self::WorkspaceUri => "workspace-uri",
            Self::Uri => "uri",
            Self::Empty => "empty",
        }
    }
}
