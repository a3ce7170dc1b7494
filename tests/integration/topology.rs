use crate::*;

/// Originate one message at `nodes[0]` and check every other node
/// delivers it exactly once.
async fn assert_delivered_once_everywhere(nodes: &[Node]) -> Result<()> {
    let mut feeds: Vec<_> = nodes.iter().map(|n| n.subscribe()).collect();

    let m = nodes[0].originate("flood");

    for (i, feed) in feeds.iter_mut().enumerate().skip(1) {
        let got = next_delivery(feed)
            .await
            .with_context(|| format!("node {i} never got the message"))?;
        assert_eq!(got.id, m.id);
    }

    // Give every redundant copy time to arrive and be suppressed.
    for (i, feed) in feeds.iter_mut().enumerate() {
        assert_quiet(feed)
            .await
            .with_context(|| format!("node {i} delivered twice"))?;
    }
    for node in nodes {
        assert!(node.seen().check_and_mark(&m.id));
    }
    Ok(())
}

/// Ring 0 → 1 → 2 → 3 → 0.
#[tokio::test]
async fn test_ring_is_loop_free() -> Result<()> {
    let nodes = start_nodes(4).await?;
    for i in 0..nodes.len() {
        let next = &nodes[(i + 1) % nodes.len()];
        nodes[i].dial(next.self_addr());
    }
    for i in 0..nodes.len() {
        wait_linked(&nodes[i], &nodes[(i + 1) % nodes.len()]).await?;
    }

    assert_delivered_once_everywhere(&nodes).await
}

/// Every node dials every other node.
#[tokio::test]
async fn test_full_mesh_is_loop_free() -> Result<()> {
    let nodes = start_nodes(4).await?;
    for a in &nodes {
        for b in &nodes {
            a.dial(b.self_addr());
        }
    }
    for a in &nodes {
        for b in &nodes {
            if a.self_addr() != b.self_addr() {
                wait_linked(a, b).await?;
            }
        }
    }

    assert_delivered_once_everywhere(&nodes).await?;
    // Self-dials inside the loop above were refused.
    for n in &nodes {
        assert_eq!(n.registry().len(), nodes.len() - 1);
    }
    Ok(())
}

/// Many messages from several originators, each delivered once per node.
#[tokio::test]
async fn test_concurrent_originators() -> Result<()> {
    // Deep enough queues that the burst below never overflows a link.
    let mut config = loopback_config();
    config.node.queue_depth = 128;
    let mut nodes = Vec::new();
    for _ in 0..3 {
        nodes.push(start_node_with(&config).await?);
    }
    for a in &nodes {
        for b in &nodes {
            a.dial(b.self_addr());
        }
    }
    for a in &nodes {
        for b in &nodes {
            if a.self_addr() != b.self_addr() {
                wait_linked(a, b).await?;
            }
        }
    }

    let mut feeds: Vec<_> = nodes.iter().map(|n| n.subscribe()).collect();
    const PER_NODE: usize = 5;
    for round in 0..PER_NODE {
        for (i, n) in nodes.iter().enumerate() {
            n.originate(format!("{i}-{round}"));
        }
    }

    // Each node hears every message except its own.
    let expected = (nodes.len() - 1) * PER_NODE;
    for (i, feed) in feeds.iter_mut().enumerate() {
        let mut ids = std::collections::HashSet::new();
        for _ in 0..expected {
            let m = next_delivery(feed).await?;
            assert!(!m.body.starts_with(&format!("{i}-")), "node {i} got its own message");
            assert!(ids.insert(m.id), "node {i} delivered a duplicate");
        }
        assert_quiet(feed).await?;
    }
    Ok(())
}
