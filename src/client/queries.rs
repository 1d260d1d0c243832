//! Query documents and schema-variant registries.
//!
//! The upstream GraphQL schema differs between deployments: optional
//! extensions (round segments, draft actions), renamed aggregates, and
//! filters that only exist on some tiers. Every fetcher therefore walks an
//! ordered list of query variants from richest to most minimal, moving to
//! the next variant when the current one is rejected as unsupported.
//!
//! The variant walk communicates through [`Fetched`]: a fetch attempt
//! either produced a value or established that this variant cannot work on
//! this schema. Real failures (auth, rate limits that survived retry,
//! malformed payloads) stay on the error channel and abort the walk.

/// Outcome of trying one query variant against the live schema.
#[derive(Debug)]
pub enum Fetched<T> {
    /// The variant is supported and produced a decoded value.
    Ok(T),
    /// The schema rejected this variant; the reason names the missing
    /// field or filter for data-quality notes.
    Unsupported(String),
}

impl<T> Fetched<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Fetched::Ok(value) => Some(value),
            Fetched::Unsupported(_) => None,
        }
    }
}

/// Titles directory. Small reference dataset, cached for hours.
pub const TITLES_QUERY: &str = "\
query Titles {
  titles {
    id
    name
    nameShortened
  }
}";

/// Team directory page with a title filter. Preferred, but the filter
/// argument is rejected on some tiers.
pub const TEAMS_FILTERED_QUERY: &str = "\
query Teams($first: Int!, $after: Cursor, $filter: TeamFilter) {
  teams(first: $first, after: $after, filter: $filter) {
    totalCount
    pageInfo {
      hasNextPage
      endCursor
    }
    edges {
      node {
        id
        name
        nameShortened
      }
    }
  }
}";

/// Team directory page without the filter argument. Fallback when
/// `TeamFilter` is unsupported; title scoping then happens client side.
pub const TEAMS_UNFILTERED_QUERY: &str = "\
query Teams($first: Int!, $after: Cursor) {
  teams(first: $first, after: $after) {
    totalCount
    pageInfo {
      hasNextPage
      endCursor
    }
    edges {
      node {
        id
        name
        nameShortened
      }
    }
  }
}";

/// One page of the series listing. Team and time filters are each
/// optional schema features, so the scan tries four shapes.
#[derive(Debug, Clone, Copy)]
pub struct SeriesListVariant {
    pub name: &'static str,
    pub with_team_filter: bool,
    pub with_time_filter: bool,
}

/// Ordered richest-first: server-side team and time filtering when
/// available, otherwise progressively more client-side filtering.
pub const SERIES_LIST_VARIANTS: [SeriesListVariant; 4] = [
    SeriesListVariant {
        name: "team_and_time",
        with_team_filter: true,
        with_time_filter: true,
    },
    SeriesListVariant {
        name: "time_only",
        with_team_filter: false,
        with_time_filter: true,
    },
    SeriesListVariant {
        name: "team_only",
        with_team_filter: true,
        with_time_filter: false,
    },
    SeriesListVariant {
        name: "bare",
        with_team_filter: false,
        with_time_filter: false,
    },
];

pub fn series_list_query(variant: &SeriesListVariant) -> String {
    let mut filter_fields = vec!["titleIds: { in: $titleIds }"];
    if variant.with_team_filter {
        filter_fields.push("teamIds: { in: $teamIds }");
    }
    if variant.with_time_filter {
        filter_fields.push("startTimeScheduled: { gte: $startedAfter }");
    }

    let mut params = vec!["$first: Int!", "$after: Cursor", "$titleIds: [ID!]"];
    if variant.with_team_filter {
        params.push("$teamIds: [ID!]");
    }
    if variant.with_time_filter {
        params.push("$startedAfter: DateTime");
    }

    format!(
        "\
query AllSeries({params}) {{
  allSeries(
    first: $first
    after: $after
    orderBy: StartTimeScheduled
    orderDirection: DESC
    filter: {{ {filter} }}
  ) {{
    totalCount
    pageInfo {{
      hasNextPage
      endCursor
    }}
    edges {{
      node {{
        id
        startTimeScheduled
        updatedAt
        format {{ name nameShortened }}
        tournament {{ id name }}
        teams {{
          baseInfo {{ id name }}
          scoreAdvantage
        }}
      }}
    }}
  }}
}}",
        params = params.join(", "),
        filter = filter_fields.join(", "),
    )
}

/// Single-series lookup. Player rosters nest under `baseInfo` on some
/// deployments and sit flat on others, so two shapes are tried.
#[derive(Debug, Clone, Copy)]
pub struct SeriesByIdVariant {
    pub name: &'static str,
    pub players_under_base_info: bool,
}

pub const SERIES_BY_ID_VARIANTS: [SeriesByIdVariant; 2] = [
    SeriesByIdVariant {
        name: "players_base_info",
        players_under_base_info: true,
    },
    SeriesByIdVariant {
        name: "players_flat",
        players_under_base_info: false,
    },
];

pub fn series_by_id_query(variant: &SeriesByIdVariant) -> String {
    let players = if variant.players_under_base_info {
        "players { baseInfo { id nickname } }"
    } else {
        "players { id nickname }"
    };
    format!(
        "\
query SeriesById($id: ID!) {{
  series(id: $id) {{
    id
    startTimeScheduled
    updatedAt
    format {{ name nameShortened }}
    tournament {{ id name }}
    teams {{
      baseInfo {{ id name }}
      scoreAdvantage
      {players}
    }}
  }}
}}"
    )
}

/// Team statistics selection shape. Three independent schema axes:
/// the optional round segment, win rate exposed as a percentage aggregate
/// versus a plain ratio, and wins as a single object versus an array of
/// per-outcome buckets.
#[derive(Debug, Clone, Copy)]
pub struct TeamStatsVariant {
    pub name: &'static str,
    pub with_segment: bool,
    pub percent_win_rate: bool,
    pub object_wins: bool,
}

/// All eight combinations, richest first.
pub const TEAM_STATS_VARIANTS: [TeamStatsVariant; 8] = [
    TeamStatsVariant { name: "segment_percent_object", with_segment: true, percent_win_rate: true, object_wins: true },
    TeamStatsVariant { name: "segment_percent_array", with_segment: true, percent_win_rate: true, object_wins: false },
    TeamStatsVariant { name: "segment_ratio_object", with_segment: true, percent_win_rate: false, object_wins: true },
    TeamStatsVariant { name: "segment_ratio_array", with_segment: true, percent_win_rate: false, object_wins: false },
    TeamStatsVariant { name: "percent_object", with_segment: false, percent_win_rate: true, object_wins: true },
    TeamStatsVariant { name: "percent_array", with_segment: false, percent_win_rate: true, object_wins: false },
    TeamStatsVariant { name: "ratio_object", with_segment: false, percent_win_rate: false, object_wins: true },
    TeamStatsVariant { name: "ratio_array", with_segment: false, percent_win_rate: false, object_wins: false },
];

pub fn team_statistics_query(variant: &TeamStatsVariant) -> String {
    let wins = if variant.object_wins {
        "won { count percentage }"
    } else {
        "won { id count percentage }"
    };
    let win_rate = if variant.percent_win_rate {
        "winRate: won { percentage }"
    } else {
        "winRate: won { count }"
    };
    let segment = if variant.with_segment {
        "\n    segment(type: ROUND) {\n      deaths { avg }\n      kills { avg }\n    }"
    } else {
        ""
    };
    format!(
        "\
query TeamStatistics($teamId: ID!, $filter: StatisticsFilter) {{
  teamStatistics(teamId: $teamId, filter: $filter) {{
    aggregationSeriesIds
    series {{
      count
      {wins}
      {win_rate}
      kills {{ avg sum }}
    }}
    game {{
      count
      {wins}
      duration {{ avg }}
    }}{segment}
  }}
}}"
    )
}

/// Player statistics selection shape: the round segment and the
/// percentage aggregate are each optional.
#[derive(Debug, Clone, Copy)]
pub struct PlayerStatsVariant {
    pub name: &'static str,
    pub with_segment: bool,
    pub percent_win_rate: bool,
}

pub const PLAYER_STATS_VARIANTS: [PlayerStatsVariant; 4] = [
    PlayerStatsVariant { name: "segment_percent", with_segment: true, percent_win_rate: true },
    PlayerStatsVariant { name: "segment_ratio", with_segment: true, percent_win_rate: false },
    PlayerStatsVariant { name: "percent", with_segment: false, percent_win_rate: true },
    PlayerStatsVariant { name: "ratio", with_segment: false, percent_win_rate: false },
];

pub fn player_statistics_query(variant: &PlayerStatsVariant) -> String {
    let win_rate = if variant.percent_win_rate {
        "winRate: won { percentage }"
    } else {
        "winRate: won { count }"
    };
    let segment = if variant.with_segment {
        "\n    segment(type: ROUND) {\n      kills { avg }\n      deaths { avg }\n    }"
    } else {
        ""
    };
    format!(
        "\
query PlayerStatistics($playerId: ID!, $filter: StatisticsFilter) {{
  playerStatistics(playerId: $playerId, filter: $filter) {{
    series {{
      count
      {win_rate}
      kills {{ avg }}
      deaths {{ avg }}
    }}{segment}
  }}
}}"
    )
}

/// Per-game statistics selections, richest first. Later entries drop the
/// fields most often missing from reduced schemas.
pub const GAME_STATS_SELECTIONS: [(&str, &str); 6] = [
    (
        "full",
        "map { name } duration started finished teams { id score won }",
    ),
    (
        "no_flags",
        "map { name } duration teams { id score won }",
    ),
    ("map_duration_score", "map { name } duration teams { id score }"),
    ("map_score", "map { name } teams { id score }"),
    ("map_won", "map { name } teams { id won }"),
    ("map_only", "map { name }"),
];

pub fn game_statistics_query(selection: &str) -> String {
    format!(
        "\
query SeriesGames($seriesId: ID!) {{
  seriesState(id: $seriesId) {{
    id
    games {{
      {selection}
    }}
  }}
}}"
    )
}

/// Draft-action selections, richest first.
pub const DRAFT_SELECTIONS: [(&str, &str); 4] = [
    (
        "full",
        "drafter { id type } type sequenceNumber draftable { id type name }",
    ),
    ("no_drafter", "type sequenceNumber draftable { id type name }"),
    ("actions_only", "type draftable { name }"),
    ("names_only", "draftable { name }"),
];

pub fn draft_actions_query(selection: &str) -> String {
    format!(
        "\
query SeriesDraft($seriesId: ID!) {{
  seriesState(id: $seriesId) {{
    id
    games {{
      draftActions {{
        {selection}
      }}
    }}
  }}
}}"
    )
}

/// Finished-series end state used for outcome and map aggregation. The
/// light shape drops per-game team details for schemas without them.
#[derive(Debug, Clone, Copy)]
pub struct EndStateVariant {
    pub name: &'static str,
    pub with_game_teams: bool,
}

pub const END_STATE_VARIANTS: [EndStateVariant; 2] = [
    EndStateVariant { name: "full", with_game_teams: true },
    EndStateVariant { name: "games_light", with_game_teams: false },
];

pub fn end_state_query(variant: &EndStateVariant) -> String {
    let games = if variant.with_game_teams {
        "games { sequenceNumber map { name } finished duration teams { id name score won } }"
    } else {
        "games { sequenceNumber map { name } finished }"
    };
    format!(
        "\
query SeriesEndState($seriesId: ID!) {{
  seriesState(id: $seriesId) {{
    id
    finished
    teams {{ id name score won players {{ id name kills deaths }} }}
    {games}
  }}
}}"
    )
}
