use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use pricefeed_cache::{Flight, FlightLeader};
use pricefeed_core::{
    AssetClass, BatchOutcome, DataCategory, MarketValue, PriceRecord, PricefeedError, keys,
    normalize_symbols,
};

use crate::Pricefeed;
use crate::core::tag_err;
use crate::router::util::{chunked, collapse_errors};

type Leader = FlightLeader<MarketValue>;
type ChainResults = HashMap<String, Result<PriceRecord, PricefeedError>>;

/// Per-symbol results of one or more orchestrated class batches.
#[derive(Debug, Default)]
pub(crate) struct ClassBatch {
    pub(crate) cached: HashMap<String, PriceRecord>,
    pub(crate) fetched: HashMap<String, PriceRecord>,
    pub(crate) failed: HashMap<String, PricefeedError>,
}

impl ClassBatch {
    fn merge(&mut self, other: Self) {
        self.cached.extend(other.cached);
        self.fetched.extend(other.fetched);
        self.failed.extend(other.failed);
    }
}

fn not_found(symbol: &str) -> PricefeedError {
    PricefeedError::not_found(format!("quote for {symbol}"))
}

impl Pricefeed {
    /// Fetch live quotes for many symbols at once.
    ///
    /// Behavior:
    /// - Symbols are trimmed, uppercased and de-duplicated (first occurrence wins).
    /// - Cached symbols never reach a provider; a fully cached request makes
    ///   no provider call at all.
    /// - Uncached symbols are chunked by the primary provider's batch size and
    ///   the chunks run concurrently under the `max_in_flight` bound. Each chunk
    ///   walks the class chain, so a symbol the primary misses is retried on the
    ///   next provider before it is given up.
    /// - Symbols that every provider failed for land in `failed_symbols` with
    ///   their last error in `failures`; the call itself still succeeds.
    /// - Without a hint, symbols are grouped by guessed class and failures are
    ///   re-batched into their next candidate class.
    ///
    /// # Errors
    /// Returns `InvalidArg` for an empty list or a malformed symbol.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "pricefeed::router::fetch_many",
            skip_all,
            fields(n = symbols.len(), hint = ?hint),
        )
    )]
    pub async fn fetch_many<S: AsRef<str>>(
        &self,
        symbols: &[S],
        hint: Option<AssetClass>,
    ) -> Result<BatchOutcome, PricefeedError> {
        let symbols = normalize_symbols(symbols)?;
        let batch = match hint {
            Some(class) => self.batch_for_class(&symbols, class).await,
            None => self.batch_with_fallback(&symbols).await,
        };
        let outcome = assemble(&symbols, batch);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            cached = outcome.cached_count,
            fetched = outcome.fetched_count,
            failed = outcome.failed_symbols.len(),
            hit_rate = outcome.cache_hit_rate,
            "batch complete"
        );
        Ok(outcome)
    }

    /// Group by guessed class, then move failures to their next candidate class.
    async fn batch_with_fallback(&self, symbols: &[String]) -> ClassBatch {
        let mut out = ClassBatch::default();
        let mut candidates: HashMap<&str, std::vec::IntoIter<AssetClass>> = symbols
            .iter()
            .map(|s| (s.as_str(), self.registry.candidates(s).into_iter()))
            .collect();
        // A symbol resolved earlier under a fallback class is cached under that
        // class only; serve it before any provider sees the guessed class.
        let mut pending: Vec<&str> = Vec::with_capacity(symbols.len());
        for s in symbols {
            let cached = candidates
                .get(s.as_str())
                .and_then(|c| self.cached_quote(s, c.as_slice()));
            match cached {
                Some(r) => {
                    out.cached.insert(s.clone(), r);
                }
                None => pending.push(s.as_str()),
            }
        }
        if pending.is_empty() {
            return out;
        }
        let mut reasons: HashMap<String, PricefeedError> = HashMap::new();

        while !pending.is_empty() {
            let mut groups: Vec<(AssetClass, Vec<String>)> = Vec::new();
            for s in &pending {
                let Some(class) = candidates.get_mut(s).and_then(Iterator::next) else {
                    continue;
                };
                match groups.iter_mut().find(|(c, _)| *c == class) {
                    Some((_, group)) => group.push((*s).to_string()),
                    None => groups.push((class, vec![(*s).to_string()])),
                }
            }

            let parts = futures::future::join_all(
                groups
                    .iter()
                    .map(|(class, group)| self.batch_for_class(group, *class)),
            )
            .await;

            let mut next = Vec::new();
            for mut part in parts {
                for (symbol, err) in std::mem::take(&mut part.failed) {
                    // A class nobody serves says less than an earlier real failure.
                    if !(matches!(err, PricefeedError::Unsupported { .. })
                        && reasons.contains_key(&symbol))
                    {
                        reasons.insert(symbol.clone(), err);
                    }
                    match candidates.get_key_value(symbol.as_str()) {
                        Some((s, rest)) if !rest.as_slice().is_empty() => next.push(*s),
                        _ => {
                            let err = reasons
                                .remove(&symbol)
                                .unwrap_or_else(|| not_found(&symbol));
                            out.failed.insert(symbol, err);
                        }
                    }
                }
                out.merge(part);
            }
            #[cfg(feature = "tracing")]
            if !next.is_empty() {
                tracing::debug!(n = next.len(), "retrying failed symbols under their next class");
            }
            // Keep input order for the next round.
            pending = symbols
                .iter()
                .map(String::as_str)
                .filter(|s| next.contains(s))
                .collect();
        }
        out
    }

    /// Orchestrate one batch for a single asset class.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "pricefeed::router::batch_for_class",
            skip_all,
            fields(class = %class, n = symbols.len()),
        )
    )]
    pub(crate) async fn batch_for_class(&self, symbols: &[String], class: AssetClass) -> ClassBatch {
        let mut out = ClassBatch::default();

        let mut needs: Vec<&String> = Vec::new();
        for s in symbols {
            match self.cache.get(&keys::price_key(class, s)) {
                Some(MarketValue::Price(r)) => {
                    out.cached.insert(s.clone(), r);
                }
                _ => needs.push(s),
            }
        }
        if needs.is_empty() {
            return out;
        }

        let mut leaders: Vec<(String, Leader)> = Vec::new();
        let mut followers = Vec::new();
        for s in needs {
            let key = keys::price_key(class, s);
            match self.cache.claim(&key) {
                Flight::Leader(leader) => {
                    // Another caller may have filled the entry since our miss.
                    if self.cache.has(&key)
                        && let Some(MarketValue::Price(r)) = self.cache.get(&key)
                    {
                        leader.complete(MarketValue::Price(r.clone()));
                        out.cached.insert(s.clone(), r);
                    } else {
                        leaders.push((s.clone(), leader));
                    }
                }
                Flight::Follower(follower) => followers.push((s.clone(), follower)),
            }
        }

        if !leaders.is_empty() {
            let size = self
                .chain(class)
                .first()
                .map_or(1, |p| self.chunk_size_for(p.as_ref()));
            let mut chunks: Vec<Vec<(String, Leader)>> = Vec::new();
            let mut leaders = leaders.into_iter().peekable();
            while leaders.peek().is_some() {
                chunks.push(leaders.by_ref().take(size).collect());
            }

            let parts: Vec<ClassBatch> = stream::iter(chunks)
                .map(|chunk| self.run_chunk(class, chunk))
                .buffer_unordered(self.cfg.max_in_flight)
                .collect()
                .await;
            for part in parts {
                out.merge(part);
            }
        }

        let mut orphans = Vec::new();
        for (s, follower) in followers {
            match follower.wait().await {
                Some(MarketValue::Price(r)) => {
                    out.fetched.insert(s, r);
                }
                _ => orphans.push(s),
            }
        }
        if !orphans.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::debug!(n = orphans.len(), "shared fetch failed; fetching independently");
            let results = self.fetch_via_chain(&orphans, class).await;
            out.merge(self.write_through(class, results, Vec::new()));
        }
        out
    }

    /// Fetch one chunk through the chain and publish the results.
    async fn run_chunk(&self, class: AssetClass, chunk: Vec<(String, Leader)>) -> ClassBatch {
        let symbols: Vec<String> = chunk.iter().map(|(s, _)| s.clone()).collect();
        let results = self.fetch_via_chain(&symbols, class).await;
        self.write_through(class, results, chunk)
    }

    /// Cache successes, release leaders and sort results into a batch.
    fn write_through(
        &self,
        class: AssetClass,
        mut results: ChainResults,
        leaders: Vec<(String, Leader)>,
    ) -> ClassBatch {
        let ttl = self.cfg.cache.ttl_for(DataCategory::Quote);
        let mut leaders: HashMap<String, Leader> = leaders.into_iter().collect();
        let mut out = ClassBatch::default();

        for (s, res) in results.drain() {
            let leader = leaders.remove(&s);
            match res {
                Ok(r) => {
                    let value = MarketValue::Price(r.clone());
                    self.cache.set(&keys::price_key(class, &s), value.clone(), ttl);
                    if let Some(leader) = leader {
                        leader.complete(value);
                    }
                    out.fetched.insert(s, r);
                }
                Err(e) => {
                    out.failed.insert(s, e);
                }
            }
        }
        for (s, _) in leaders {
            let e = not_found(&s);
            out.failed.insert(s, e);
        }
        out
    }

    /// Walk the class chain for a set of symbols.
    ///
    /// Each provider receives the symbols still unresolved, split by its own
    /// chunk size. Every requested symbol is present in the result.
    async fn fetch_via_chain(&self, symbols: &[String], class: AssetClass) -> ChainResults {
        let mut resolved = ChainResults::with_capacity(symbols.len());
        let mut errors: HashMap<String, Vec<PricefeedError>> = HashMap::new();
        let mut remaining: Vec<String> = symbols.to_vec();

        for p in self.chain(class) {
            if remaining.is_empty() {
                break;
            }
            let calls = chunked(&remaining, self.chunk_size_for(p.as_ref()))
                .into_iter()
                .map(|chunk| {
                    let p = Arc::clone(p);
                    async move {
                        let res = self
                            .provider_call(p.name(), "quote", async {
                                Ok::<_, PricefeedError>(p.fetch_batch(&chunk, class).await)
                            })
                            .await;
                        (chunk, res)
                    }
                });

            let mut still = Vec::new();
            for (chunk, res) in futures::future::join_all(calls).await {
                match res {
                    Ok(mut batch) => {
                        for s in chunk {
                            match batch.remove(&s).unwrap_or_else(|| Err(not_found(&s))) {
                                Ok(r) => {
                                    resolved.insert(s, Ok(r));
                                }
                                Err(PricefeedError::Unsupported { .. }) => still.push(s),
                                Err(e) => {
                                    #[cfg(feature = "tracing")]
                                    tracing::debug!(provider = p.name(), symbol = %s, error = %e, "symbol failed");
                                    errors.entry(s.clone()).or_default().push(tag_err(p.name(), e));
                                    still.push(s);
                                }
                            }
                        }
                    }
                    Err(e) => {
                        for s in chunk {
                            errors.entry(s.clone()).or_default().push(e.clone());
                            still.push(s);
                        }
                    }
                }
            }
            remaining = still;
        }

        for s in remaining {
            let errs = errors.remove(&s).unwrap_or_default();
            let attempted = !errs.is_empty();
            let e = collapse_errors("quote", attempted, errs, Some(format!("quote for {s}")));
            resolved.insert(s, Err(e));
        }
        resolved
    }
}

/// Build the caller-facing outcome in input order.
fn assemble(symbols: &[String], mut batch: ClassBatch) -> BatchOutcome {
    let mut out = BatchOutcome::default();
    for s in symbols {
        if let Some(r) = batch.cached.remove(s) {
            out.cached_count += 1;
            out.records.push(r);
        } else if let Some(r) = batch.fetched.remove(s) {
            out.fetched_count += 1;
            out.records.push(r);
        } else {
            let e = batch.failed.remove(s).unwrap_or_else(|| not_found(s));
            out.failed_symbols.push(s.clone());
            out.failures.insert(s.clone(), e);
        }
    }
    out.cache_hit_rate = BatchOutcome::hit_rate(out.cached_count, symbols.len());
    out
}
