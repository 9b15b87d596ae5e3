use rocket::{response::Redirect, serde::json::Json, Route, State};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    api::{BallotEntry, BallotPaper, ElectionSummary, ThankYou},
    candidate::CandidateId,
    session::{ElectionSession, SessionState},
};
use crate::staging::photo_url;

pub fn routes() -> Vec<Route> {
    routes![index, ballot, vote_for, thank_you]
}

#[get("/")]
async fn index(session: &State<ElectionSession>) -> Json<ElectionSummary> {
    Json(ElectionSummary {
        election_name: session.name().to_string(),
        state: session.state(),
    })
}

#[get("/vote")]
async fn ballot(
    session: &State<ElectionSession>,
    config: &State<Config>,
) -> Result<Json<BallotPaper>> {
    let state = session.state();
    if state != SessionState::Voting {
        return Err(Error::WrongState {
            expected: SessionState::Voting,
            actual: state,
        });
    }

    let candidates = session
        .snapshot()
        .into_iter()
        .map(|candidate| BallotEntry {
            id: candidate.id,
            photo_url: photo_url(&candidate.photo),
            vote_link: uri!(vote_for(candidate.id)).to_string(),
            name: candidate.name,
        })
        .collect();
    let (portrait_width, portrait_height) = config.portrait_size();

    Ok(Json(BallotPaper {
        election_name: session.name().to_string(),
        portrait_width,
        portrait_height,
        candidates,
    }))
}

#[get("/vote_for/<candidate_id>")]
async fn vote_for(candidate_id: CandidateId, session: &State<ElectionSession>) -> Result<Redirect> {
    session.cast_vote(candidate_id)?;
    Ok(Redirect::to(uri!(thank_you)))
}

#[get("/thank-you")]
async fn thank_you(config: &State<Config>) -> Json<ThankYou> {
    Json(ThankYou {
        message: "Thank you for voting!".to_string(),
        redirect_after: config.thank_you_delay().as_secs(),
        redirect_to: uri!(index).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use rocket::{http::Status, local::asynchronous::Client};

    use super::*;
    use crate::model::candidate::Candidate;

    fn votes(client: &Client) -> Vec<u64> {
        client
            .rocket()
            .state::<ElectionSession>()
            .unwrap()
            .snapshot()
            .iter()
            .map(|c: &Candidate| c.votes)
            .collect()
    }

    #[backend_test]
    async fn index_shows_state(client: Client) {
        let response = client.get(uri!(index)).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let summary: ElectionSummary = response.into_json().await.unwrap();
        assert_eq!(summary.election_name, "Student Council");
        assert_eq!(summary.state, SessionState::Voting);
    }

    #[backend_test]
    async fn ballot_lists_candidates_without_counts(client: Client) {
        client.get(uri!(vote_for(CandidateId(1)))).dispatch().await;

        let response = client.get(uri!(ballot)).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        assert!(!body.contains("votes"));

        let paper: BallotPaper = rocket::serde::json::from_str(&body).unwrap();
        assert_eq!(paper.portrait_width, 300);
        assert_eq!(paper.portrait_height, 300);
        let names: Vec<_> = paper.candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Chris Riches", "Parry Hotter", "Ada Lovelace"]);
        assert_eq!(paper.candidates[1].id, CandidateId(2));
        assert_eq!(paper.candidates[1].vote_link, "/vote_for/2");
        assert_eq!(paper.candidates[1].photo_url, "/photos/parry_hotter.jpg");
    }

    #[backend_test]
    async fn vote_counts_and_redirects(client: Client) {
        let response = client.get(uri!(vote_for(CandidateId(3)))).dispatch().await;
        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(response.headers().get_one("Location"), Some("/thank-you"));

        // Nothing stops the same browser voting again.
        client.get(uri!(vote_for(CandidateId(3)))).dispatch().await;
        client.get(uri!(vote_for(CandidateId(1)))).dispatch().await;
        assert_eq!(votes(&client), vec![1, 0, 2]);
    }

    #[backend_test]
    async fn invalid_candidate_rejected(client: Client) {
        for path in ["/vote_for/0", "/vote_for/4", "/vote_for/-1", "/vote_for/abc"] {
            let response = client.get(path).dispatch().await;
            assert_eq!(response.status(), Status::NotFound, "{path}");
        }
        assert_eq!(votes(&client), vec![0, 0, 0]);
    }

    #[backend_test(configuring)]
    async fn no_voting_before_open(client: Client) {
        let response = client.get(uri!(ballot)).dispatch().await;
        assert_eq!(response.status(), Status::Conflict);

        let response = client.get(uri!(vote_for(CandidateId(1)))).dispatch().await;
        assert_eq!(response.status(), Status::Conflict);
        assert_eq!(votes(&client), vec![0, 0, 0]);
    }

    #[backend_test]
    async fn thank_you_returns_home(client: Client) {
        let response = client.get(uri!(thank_you)).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let thanks: ThankYou = response.into_json().await.unwrap();
        assert_eq!(thanks.redirect_to, "/");
        assert_eq!(thanks.redirect_after, 10);
    }
}
