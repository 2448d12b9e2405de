// Skill clustering and salary-gap analysis.
// Stages run strictly in order, each consuming the previous stage's artifact:
// corpus → vectorizer → (selection) → assignment → salary → skill_value.
// `pipeline` is the stateless orchestrator; `handlers` exposes it over HTTP.

pub mod assignment;
pub mod corpus;
pub mod error;
pub mod export;
pub mod handlers;
pub mod kmeans;
pub mod pipeline;
pub mod salary;
pub mod selection;
pub mod skill_value;
pub mod vectorizer;
