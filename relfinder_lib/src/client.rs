//! Typed operations over the service's pages and XHR endpoints.

use std::collections::{BTreeMap, HashMap};

use relfinder_api::{
    Clock, Exchange, LogSink, ReqwestExchange, Request, SystemClock, Transport,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::SessionConfig;
use crate::decode::{self, DATA_LAYER, INHERITANCE_VIEW};
use crate::session::Session;
use crate::types::{
    reference_gender, AccountMetadata, Gender, InheritanceView, MatchRecord,
    PairwiseSegmentRecord, ProfilePair, ProfileRecord, RelfinderResponse,
};
use crate::Error;

pub const PROFILES_PATH: &str = "/you/";
pub const INHERITANCE_PATH: &str = "/you/inheritance/";
pub const RELFINDER_PATH: &str = "/you/relfinder/fetch/";
pub const IBDVIEW_PATH: &str = "/you/ibdview/";
pub const PROFILE_PAGE_PATH: &str = "/user/";
pub const ANCESTRY_FINDER_LOOKUP_PATH: &str = "/you/labs/ancestry_finder/lookup/";
pub const ANCESTRY_FINDER_EXPORT_PATH: &str = "/you/labs/ancestry_finder/export/";

const PROFILES_PAGE: &str = "profile listing";
const INHERITANCE_PAGE: &str = "inheritance view";
const RELFINDER_PAGE: &str = "match finder";
const IBDVIEW_PAGE: &str = "pairwise segments";
const ANCESTRY_FINDER_PAGE: &str = "ancestry finder";

/// Outcome of fetching pairwise segments for many profile pairs.
#[derive(Debug, Default)]
pub struct PairwiseSweep {
    /// Pairs that share at least one segment.
    pub records: BTreeMap<ProfilePair, PairwiseSegmentRecord>,
    /// Pairs fetched successfully but with nothing in common.
    pub empty: Vec<ProfilePair>,
    /// Pairs whose request failed. Other pairs are unaffected.
    pub failures: Vec<(ProfilePair, Error)>,
}

/// Client for one account, serialising every call through a single [`Session`].
pub struct Client<E, C> {
    session: Session<E, C>,
    /// Sex reported in match records, keyed by profile id.
    known_genders: HashMap<String, Gender>,
}

impl Client<ReqwestExchange, SystemClock> {
    /// Builds the HTTP stack from `config` and signs in.
    pub async fn connect(config: &SessionConfig, sink: LogSink) -> Result<Self, Error> {
        config.validate()?;
        let transport = Transport::new(
            ReqwestExchange::new()?,
            SystemClock,
            config.transport_options(sink),
        );
        let mut session = Session::new(transport, config.credentials.clone());
        session.login().await?;
        Ok(Self::new(session))
    }
}

impl<E: Exchange, C: Clock> Client<E, C> {
    pub fn new(session: Session<E, C>) -> Self {
        Self {
            session,
            known_genders: HashMap::new(),
        }
    }

    pub fn session(&self) -> &Session<E, C> {
        &self.session
    }

    /// Account metadata and every profile on the account, owner first.
    pub async fn list_profiles(&mut self) -> Result<(AccountMetadata, Vec<ProfileRecord>), Error> {
        let body = self.session.call(Request::get(PROFILES_PATH)).await?;
        let text = decode::normalize_markup(&body)?;

        let data_layer = decode::extract_embedded_json(&text, &DATA_LAYER, PROFILES_PAGE)?;
        let metadata: AccountMetadata = serde_json::from_value(data_layer)
            .map_err(|e| Error::malformed(PROFILES_PAGE, DATA_LAYER.name, e))?;
        let owner_id = metadata
            .profile_id()
            .ok_or_else(|| Error::malformed(PROFILES_PAGE, DATA_LAYER.name, "no profile_id"))?
            .to_string();
        let owner_label = decode::extract_owner_label(&text, PROFILES_PAGE)?;

        let mut profiles = vec![ProfileRecord::new(owner_id, owner_label)];
        profiles.extend(
            decode::extract_profile_options(&text)?
                .into_iter()
                .map(|fragment| ProfileRecord::new(fragment.id, fragment.label)),
        );
        tracing::info!(profiles = profiles.len(), "Listed profiles");
        Ok((metadata, profiles))
    }

    /// Profiles covered by the inheritance page. Genders are left unresolved.
    pub async fn fetch_inheritance_view(&mut self) -> Result<InheritanceView, Error> {
        let body = self.session.call(Request::get(INHERITANCE_PATH)).await?;
        let text = decode::normalize_markup(&body)?;
        let value = decode::extract_embedded_json(&text, &INHERITANCE_VIEW, INHERITANCE_PAGE)?;
        serde_json::from_value(value)
            .map_err(|e| Error::malformed(INHERITANCE_PAGE, INHERITANCE_VIEW.name, e))
    }

    /// Like [`Client::fetch_inheritance_view`], with `genders` filled in.
    pub async fn fetch_inheritance_view_with_genders(&mut self) -> Result<InheritanceView, Error> {
        let mut view = self.fetch_inheritance_view().await?;
        let mut genders = Vec::with_capacity(view.people_ids.len());
        for id in &view.people_ids {
            genders.push(self.resolve_gender(id).await?);
        }
        view.genders = genders;
        Ok(view)
    }

    /// Potential relatives of one profile.
    ///
    /// The sex of every match with a profile id is remembered for
    /// [`Client::resolve_gender`].
    pub async fn fetch_matches(&mut self, profile_id: &str) -> Result<Vec<MatchRecord>, Error> {
        let request = Request::get(RELFINDER_PATH)
            .query("profile_id", profile_id)
            .xhr();
        let response: RelfinderResponse = self.call_json(request, RELFINDER_PAGE, "match list").await?;

        for record in &response.matches {
            if let Some(ehid) = record.ehid() {
                self.known_genders.insert(ehid.to_string(), record.gender());
            }
        }
        tracing::info!(profile = profile_id, matches = response.matches.len(), "Fetched matches");
        Ok(response.matches)
    }

    /// Shared segments between two profiles.
    ///
    /// The result may be the canonical "nothing shared" payload; check
    /// [`PairwiseSegmentRecord::has_shared_segments`] before using it.
    pub async fn fetch_pairwise_segments(
        &mut self,
        profile_a: &str,
        profile_b: &str,
    ) -> Result<PairwiseSegmentRecord, Error> {
        let request = Request::post(IBDVIEW_PATH, [("p1", profile_a), ("p2", profile_b)]).xhr();
        let mut record: PairwiseSegmentRecord =
            self.call_json(request, IBDVIEW_PAGE, "segment payload").await?;
        if record.profile_a.is_empty() {
            record.profile_a = profile_a.to_string();
        }
        if record.profile_b.is_empty() {
            record.profile_b = profile_b.to_string();
        }
        Ok(record)
    }

    /// Fetches segments for every pair of `profile_ids` that `skip` does not
    /// exclude, keeping only pairs with shared segments.
    pub async fn sweep_pairwise_segments<F>(&mut self, profile_ids: &[String], skip: F) -> PairwiseSweep
    where
        F: Fn(&str, &str) -> bool,
    {
        let mut sweep = PairwiseSweep::default();
        for (a, b) in profile_pairs(profile_ids) {
            if skip(a, b) {
                continue;
            }
            let pair = ProfilePair::new(a, b);
            match self.fetch_pairwise_segments(a, b).await {
                Ok(record) if record.has_shared_segments() => {
                    sweep.records.insert(pair, record);
                }
                Ok(_) => sweep.empty.push(pair),
                Err(e) => {
                    tracing::error!(p1 = a, p2 = b, "Pairwise segment lookup failed: {}", e);
                    sweep.failures.push((pair, e));
                }
            }
        }
        sweep
    }

    /// Sex shown on a profile's public page.
    ///
    /// Reference samples are answered from a fixed list without a request.
    pub async fn fetch_gender(&mut self, profile_id: &str) -> Result<Gender, Error> {
        if let Some(gender) = reference_gender(profile_id) {
            return Ok(gender);
        }
        let body = self
            .session
            .call(Request::get(PROFILE_PAGE_PATH).query("profile", profile_id))
            .await?;
        decode::extract_sex(&decode::normalize_markup(&body)?)
    }

    /// Sex of a profile, preferring what earlier match lookups reported.
    pub async fn resolve_gender(&mut self, profile_id: &str) -> Result<Gender, Error> {
        if let Some(gender) = reference_gender(profile_id) {
            return Ok(gender);
        }
        if let Some(gender) = self.known_genders.get(profile_id) {
            return Ok(*gender);
        }
        let gender = self.fetch_gender(profile_id).await?;
        self.known_genders.insert(profile_id.to_string(), gender);
        Ok(gender)
    }

    pub async fn fetch_ancestry_finder(&mut self, profile_id: &str) -> Result<Value, Error> {
        let request = Request::get(ANCESTRY_FINDER_LOOKUP_PATH)
            .query("profile_id_encrypted", profile_id)
            .xhr();
        self.call_json(request, ANCESTRY_FINDER_PAGE, "lookup payload").await
    }

    /// Raw CSV export of the ancestry finder table.
    pub async fn export_ancestry_finder_csv(&mut self, profile_id: &str) -> Result<String, Error> {
        let request = Request::get(ANCESTRY_FINDER_EXPORT_PATH)
            .query("profile_id_encrypted", profile_id)
            .xhr();
        self.session.call(request).await
    }

    async fn call_json<T: DeserializeOwned>(
        &mut self,
        request: Request,
        page: &'static str,
        what: &'static str,
    ) -> Result<T, Error> {
        let body = self.session.call(request).await?;
        serde_json::from_str(&body).map_err(|e| Error::malformed(page, what, e))
    }
}

/// Every unordered pair of `ids`, as `(ids[j], ids[i])` with `j < i`.
pub fn profile_pairs(ids: &[String]) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();
    for (i, later) in ids.iter().enumerate() {
        for earlier in &ids[..i] {
            pairs.push((earlier.as_str(), later.as_str()));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_follow_export_order() {
        let ids: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            profile_pairs(&ids),
            vec![("a", "b"), ("a", "c"), ("b", "c")]
        );
        assert!(profile_pairs(&ids[..1]).is_empty());
    }
}
