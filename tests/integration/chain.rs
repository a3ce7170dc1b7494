use crate::*;

/// A – B – C with no direct A–C link: A's message reaches C through B,
/// even after A's link to B dropped messages under load.
#[tokio::test]
async fn test_chain_relays_through_middle() -> Result<()> {
    let mut config = loopback_config();
    config.node.queue_depth = 1;
    let a = start_node_with(&config).await?;
    let b = start_node().await?;
    let c = start_node().await?;
    let mut b_feed = b.subscribe();
    let mut c_feed = c.subscribe();

    a.dial(b.self_addr());
    b.dial(c.self_addr());
    wait_linked(&a, &b).await?;
    wait_linked(&b, &c).await?;
    assert!(!a.registry().contains(c.self_addr()));

    // The test runtime is single-threaded, so A's link task cannot drain
    // its queue during this burst: the first message fits, the rest drop.
    let burst: Vec<Message> = (0..20).map(|i| a.originate(format!("burst {i}"))).collect();
    assert_eq!(next_delivery(&mut b_feed).await?.id, burst[0].id);
    assert_eq!(next_delivery(&mut c_feed).await?.id, burst[0].id);

    let m = a.originate("through the middle");
    assert_eq!(next_delivery(&mut b_feed).await?.id, m.id);

    let got = next_delivery(&mut c_feed).await?;
    assert_eq!(got.id, m.id);
    assert_eq!(got.body, "through the middle");
    // Forwarded copies keep the originator's address, so C dials A directly.
    assert_eq!(got.addr, a.self_addr());
    wait_linked(&c, &a).await?;

    for dropped in &burst[1..] {
        assert!(
            !c.seen().check_and_mark(&dropped.id),
            "message dropped by the A -> B link must never reach C"
        );
    }
    Ok(())
}

/// A link whose peer went away is rebuilt on the next message from it.
#[tokio::test]
async fn test_link_reforms_after_peer_restart() -> Result<()> {
    let a = start_node().await?;
    let b = start_node().await?;
    let mut a_feed = a.subscribe();

    b.dial(a.self_addr());
    wait_linked(&b, &a).await?;
    b.originate("one");
    next_delivery(&mut a_feed).await?;
    wait_linked(&a, &b).await?;

    // Dropping B's entry closes its queue, which ends the B → A link.
    b.registry().remove(a.self_addr());
    assert!(b.dial(a.self_addr()).is_some());
    wait_linked(&b, &a).await?;

    b.originate("two");
    assert_eq!(next_delivery(&mut a_feed).await?.body, "two");
    Ok(())
}
