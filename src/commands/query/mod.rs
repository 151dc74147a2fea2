mod answer;
mod corpus;
mod output;
mod run;
mod scoring;
#[cfg(test)]
mod tests;

pub(crate) use run::run;
