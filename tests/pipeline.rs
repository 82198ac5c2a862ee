//! End-to-end integration tests for the loreweave engine.
//!
//! These tests exercise the full pipeline from world authoring through
//! candidate search, relation augmentation, chain assembly, rendering, and
//! prompt assembly, using the deterministic hashing embedder.

use loreweave::engine::{Engine, EngineConfig};
use loreweave::graph::RefTarget;
use loreweave::model::{ClaimId, EntityId, EntityKind, StructuralKind, Veracity};

fn test_engine() -> Engine {
    Engine::new(EngineConfig { embedding_dim: 128, ..Default::default() }).unwrap()
}

struct Manor {
    engine: Engine,
    elin: EntityId,
    alrik: EntityId,
    maria: EntityId,
}

/// A small manor drama: Elin knows about the fire, the argument that caused
/// it, and (via her family) the mortgage. A relation claim ties Alrik and
/// Maria together.
fn manor() -> Manor {
    let engine = test_engine();
    let elin = engine.create_entity(EntityKind::Npc, "Elin").unwrap();
    let alrik = engine.create_entity(EntityKind::Npc, "Alrik").unwrap();
    let maria = engine.create_entity(EntityKind::Npc, "Maria").unwrap();
    Manor { engine, elin, alrik, maria }
}

impl Manor {
    fn known_claim(&self, content: &str) -> ClaimId {
        let id = self.engine.create_claim(content, Veracity::Truth).unwrap();
        self.engine.link_knowledge(self.elin, id, 1.0, 1.0).unwrap();
        id
    }
}

#[test]
fn end_to_end_retrieval_respects_access_scope() {
    let engine = test_engine();
    let bruno = engine.create_entity(EntityKind::Npc, "Bruno").unwrap();

    // Two claims Bruno knows, one he does not, all close to the question.
    let first = engine
        .create_claim("Maria is Bruno's mother.", Veracity::Truth)
        .unwrap();
    let second = engine
        .create_claim("Bruno's mother Maria lives by the river.", Veracity::Truth)
        .unwrap();
    let outside = engine
        .create_claim("Maria is Bruno's mother, the priest says.", Veracity::Truth)
        .unwrap();
    engine.link_knowledge(bruno, first, 1.0, 1.0).unwrap();
    engine.link_knowledge(bruno, second, 1.0, 1.0).unwrap();
    let _ = outside;

    let out = engine
        .retrieve_and_render("Bruno", "Who is your mother?")
        .unwrap();

    assert_eq!(out.knowledge_chains.len(), 2);
    assert!(out.relation_chains.is_empty());
    for chain in &out.knowledge_chains {
        assert!(chain.text.contains("mother"));
        assert!(!chain.text.contains("priest"));
    }
    assert!(out.prompt.contains("YOUR KNOWLEDGE OF THE QUESTION:"));
    assert!(out.prompt.ends_with("BRUNO:"));
}

#[test]
fn dependency_chains_render_dependencies_first() {
    let m = manor();
    let fire = m.known_claim("The east wing of the manor burned down.");
    let argument = m.known_claim("Alrik knocked over a lantern during an argument.");
    m.engine
        .link_reference(fire, RefTarget::Claim(argument))
        .unwrap();

    let out = m
        .engine
        .retrieve_and_render("Elin", "What happened to the east wing of the manor?")
        .unwrap();

    // The argument claim is subsumed into the fire chain: one chain of two,
    // dependency rendered before the dependent.
    let chain = out
        .knowledge_chains
        .iter()
        .find(|c| c.chain_length == 2)
        .expect("expected a two-claim chain");
    let lantern_at = chain.text.find("lantern").unwrap();
    let burned_at = chain.text.find("burned down").unwrap();
    assert!(lantern_at < burned_at);

    // And it must not also render standalone.
    let standalone = out
        .knowledge_chains
        .iter()
        .filter(|c| c.text.contains("lantern") && c.chain_length == 1)
        .count();
    assert_eq!(standalone, 0);
}

#[test]
fn relation_claims_surface_in_the_relations_section() {
    let m = manor();
    let dinner = m.known_claim("Alrik argued with Maria at dinner in the great hall.");
    m.engine
        .link_reference(dinner, RefTarget::Entity(m.alrik))
        .unwrap();
    m.engine
        .link_reference(dinner, RefTarget::Entity(m.maria))
        .unwrap();

    let marriage = m
        .engine
        .create_relation_claim("Alrik is married to Maria.", Veracity::Truth)
        .unwrap();
    m.engine.link_knowledge(m.elin, marriage, 1.0, 1.0).unwrap();
    m.engine
        .link_reference(marriage, RefTarget::Entity(m.alrik))
        .unwrap();
    m.engine
        .link_reference(marriage, RefTarget::Entity(m.maria))
        .unwrap();

    let out = m
        .engine
        .retrieve_and_render("Elin", "What happened at dinner in the great hall?")
        .unwrap();

    assert!(
        out.relation_chains
            .iter()
            .any(|c| c.text.contains("married")),
        "the marriage claim should be pulled in by structural overlap"
    );
    let relations_at = out.prompt.find("YOUR RELATIONS:").unwrap();
    let married_at = out.prompt.find("married").unwrap();
    assert!(married_at > relations_at);
}

#[test]
fn belief_and_stance_shape_the_rendered_text() {
    let m = manor();
    let secret = m
        .engine
        .create_claim("Elin set the fire herself.", Veracity::Truth)
        .unwrap();
    m.engine
        .set_negative(secret, "Elin had nothing to do with the fire.")
        .unwrap();
    // Elin believes the negation and would deny the accusation.
    m.engine.link_knowledge(m.elin, secret, -0.9, 0.5).unwrap();

    let out = m
        .engine
        .retrieve_and_render("Elin", "Did Elin set the fire?")
        .unwrap();

    let chain = &out.knowledge_chains[0];
    assert!(chain.text.contains("nothing to do with the fire"));
    assert!(chain.text.ends_with("but you deny this."));
    assert_eq!(chain.veracity, Veracity::Truth);
}

#[test]
fn group_knowledge_reaches_members_with_group_weights() {
    let m = manor();
    let family = m.engine.create_entity(EntityKind::Group, "von Dahlen").unwrap();
    m.engine.link_member(m.elin, family).unwrap();

    let mortgage = m
        .engine
        .create_claim("The manor estate is mortgaged to the bank.", Veracity::Truth)
        .unwrap();
    // The family half-believes it and avoids the topic.
    m.engine.link_knowledge(family, mortgage, 0.5, 0.1).unwrap();

    let out = m
        .engine
        .retrieve_and_render("Elin", "Is the manor estate mortgaged?")
        .unwrap();

    let chain = &out.knowledge_chains[0];
    assert!(chain.text.starts_with("It is possible that"));
    assert!(chain.text.ends_with("which you avoid discussing."));
}

#[test]
fn cyclic_references_do_not_hang_retrieval() {
    let m = manor();
    let a = m.known_claim("The steward covers for the cook.");
    let b = m.known_claim("The cook covers for the steward.");
    m.engine.link_reference(a, RefTarget::Claim(b)).unwrap();
    m.engine.link_reference(b, RefTarget::Claim(a)).unwrap();

    // Must terminate despite the cycle. Each candidate sits in the other's
    // chain, so both are mutually subsumed and no top-level chain remains.
    let out = m
        .engine
        .retrieve_and_render("Elin", "Who covers for the cook and the steward?")
        .unwrap();
    assert!(out.knowledge_chains.is_empty());
}

#[test]
fn deleting_a_claim_removes_it_from_retrieval() {
    let m = manor();
    let claim = m.known_claim("The harvest failed this autumn.");

    let before = m
        .engine
        .retrieve_and_render("Elin", "How was the harvest this autumn?")
        .unwrap();
    assert!(!before.knowledge_chains.is_empty());

    m.engine.delete_claim(claim).unwrap();
    let after = m
        .engine
        .retrieve_and_render("Elin", "How was the harvest this autumn?")
        .unwrap();
    assert!(after.knowledge_chains.is_empty());
}

#[test]
fn structural_and_affective_edges_author_cleanly() {
    let m = manor();
    m.engine
        .link_structural(m.alrik, m.elin, StructuralKind::ParentTo, 0.2)
        .unwrap();
    m.engine.link_affect(m.elin, m.alrik, -0.6, 0.3).unwrap();
    // Authoring relations must not disturb retrieval for an unrelated question.
    let out = m.engine.retrieve_and_render("Elin", "Hello?").unwrap();
    assert!(out.prompt.contains("(No relevant knowledge)"));
}

#[test]
fn refresh_embedding_tracks_content_changes() {
    let m = manor();
    let claim = m.known_claim("The stable roof leaks.");
    m.engine
        .graph()
        .update_claim(claim, |c| c.content = "The chapel bell cracked.".into())
        .unwrap();
    m.engine.refresh_embedding(claim).unwrap();

    let out = m
        .engine
        .retrieve_and_render("Elin", "What happened to the chapel bell?")
        .unwrap();
    assert!(
        out.knowledge_chains
            .iter()
            .any(|c| c.text.contains("chapel bell"))
    );
}
