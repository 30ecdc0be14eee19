pub mod test_candidate_queue;
pub mod test_glare;
pub mod test_offer_answer;
