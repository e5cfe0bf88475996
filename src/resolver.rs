//! Iterative resolution: ask a root server, then follow NS referrals down to a server that
//! answers. See RFC 1034 section 5.3.3.
use crate::{
    dns_types::{Class, RecordType},
    error::{ArgError, ResolveError},
    io::Transport,
    message::{
        header::ResponseCode,
        question::Question,
        record::{Record, RecordData},
        Message,
    },
};
use rand::Rng;
use std::{
    collections::{HashMap, HashSet},
    fmt,
    net::Ipv4Addr,
    str::FromStr,
};
use tracing::{debug, instrument, warn};

/// Every query carries the same id; only one is ever in flight.
pub const QUERY_ID: u16 = 12354;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootServer {
    pub hostname: &'static str,
    pub address: Ipv4Addr,
}

/// Root hints, <https://www.iana.org/domains/root/servers>
pub static ROOT_SERVERS: [RootServer; 13] = [
    RootServer {
        hostname: "a.root-servers.net",
        address: Ipv4Addr::new(198, 41, 0, 4),
    },
    RootServer {
        hostname: "b.root-servers.net",
        address: Ipv4Addr::new(199, 9, 14, 201),
    },
    RootServer {
        hostname: "c.root-servers.net",
        address: Ipv4Addr::new(192, 33, 4, 12),
    },
    RootServer {
        hostname: "d.root-servers.net",
        address: Ipv4Addr::new(199, 7, 91, 13),
    },
    RootServer {
        hostname: "e.root-servers.net",
        address: Ipv4Addr::new(192, 203, 230, 10),
    },
    RootServer {
        hostname: "f.root-servers.net",
        address: Ipv4Addr::new(192, 5, 5, 241),
    },
    RootServer {
        hostname: "g.root-servers.net",
        address: Ipv4Addr::new(192, 112, 36, 4),
    },
    RootServer {
        hostname: "h.root-servers.net",
        address: Ipv4Addr::new(198, 97, 190, 53),
    },
    RootServer {
        hostname: "i.root-servers.net",
        address: Ipv4Addr::new(192, 36, 148, 17),
    },
    RootServer {
        hostname: "j.root-servers.net",
        address: Ipv4Addr::new(192, 58, 128, 30),
    },
    RootServer {
        hostname: "k.root-servers.net",
        address: Ipv4Addr::new(193, 0, 14, 129),
    },
    RootServer {
        hostname: "l.root-servers.net",
        address: Ipv4Addr::new(199, 7, 83, 42),
    },
    RootServer {
        hostname: "m.root-servers.net",
        address: Ipv4Addr::new(202, 12, 27, 33),
    },
];

fn random_root() -> &'static RootServer {
    &ROOT_SERVERS[rand::thread_rng().gen_range(0..ROOT_SERVERS.len())]
}

/// Where to send the first query instead of a random root server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerOverride {
    /// Picked by the letter its hostname starts with, e.g. `k`.
    Root(&'static RootServer),
    Address(Ipv4Addr),
}

impl ServerOverride {
    pub fn address(&self) -> Ipv4Addr {
        match self {
            Self::Root(root) => root.address,
            Self::Address(ip) => *ip,
        }
    }
}

impl FromStr for ServerOverride {
    type Err = ArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        if value.chars().count() == 1 {
            return ROOT_SERVERS
                .iter()
                .find(|root| root.hostname.starts_with(value.as_str()))
                .map(Self::Root)
                .ok_or(ArgError::UnknownRootServer(value));
        }
        value
            .parse()
            .map(Self::Address)
            .map_err(|_| ArgError::BadIpv4(value))
    }
}

impl fmt::Display for ServerOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root(root) => write!(f, "{} ({})", root.hostname, root.address),
            Self::Address(ip) => write!(f, "{ip}"),
        }
    }
}

/// What to look up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub domain_name: String,
    pub record_type: RecordType,
    pub class: Class,
    pub server: Option<ServerOverride>,
}

impl Request {
    /// An A/IN lookup starting from a random root server.
    pub fn new(domain_name: impl Into<String>) -> Self {
        Self {
            domain_name: domain_name.into(),
            record_type: RecordType::A,
            class: Class::IN,
            server: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Queries one resolution may send, counting the nested lookups of nameserver
    /// addresses it needs along the way.
    pub max_hops: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { max_hops: 20 }
    }
}

/// How a resolution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A server returned records in its answer section.
    Answered,
    /// A server replied with an error code.
    ServerError(ResponseCode),
    /// None of the referred nameservers could be reached.
    DeadEnd,
    /// Ran out of hops before finding an answer.
    HopLimit,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Answered => write!(f, "answered"),
            Self::ServerError(code) => write!(f, "server error: {code}"),
            Self::DeadEnd => write!(f, "no referred nameserver could be reached"),
            Self::HopLimit => write!(f, "gave up after too many referrals"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The answer section of the final response. Empty unless `outcome` is `Answered`.
    pub records: Vec<Record>,
    pub outcome: Outcome,
}

impl Resolution {
    fn nothing(outcome: Outcome) -> Self {
        Self {
            records: Vec::new(),
            outcome,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Just the records, for callers that only care whether something was found.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

/// Where a referral leads.
enum Referral {
    Follow(Ipv4Addr),
    Stop(Outcome),
}

pub struct Resolver<T> {
    transport: T,
    config: ResolverConfig,
}

impl<T: Transport> Resolver<T> {
    pub fn new(transport: T, config: ResolverConfig) -> Self {
        Self { transport, config }
    }

    pub fn resolve(&mut self, request: &Request) -> Result<Resolution, ResolveError> {
        let mut hops_left = self.config.max_hops;
        self.resolve_within(request, &mut hops_left)
    }

    /// Resolve `request`, spending hops from a budget shared with any nested lookups.
    #[instrument(
        level = "debug",
        skip_all,
        fields(name = %request.domain_name, rtype = %request.record_type)
    )]
    fn resolve_within(
        &mut self,
        request: &Request,
        hops_left: &mut usize,
    ) -> Result<Resolution, ResolveError> {
        let question = Question::new(
            request.domain_name.clone(),
            request.record_type,
            request.class,
        );
        let mut server = match request.server {
            Some(chosen) => {
                debug!(%chosen, "starting at the chosen server");
                chosen.address()
            }
            None => random_root().address,
        };
        debug!(%question, %server, "resolving");
        let query = Message::new_query(QUERY_ID, question).serialize_bytes()?;
        // Servers already asked this question. Being referred back to one is a loop.
        let mut visited = HashSet::new();
        loop {
            if *hops_left == 0 {
                warn!(%server, "hop limit reached");
                return Ok(Resolution::nothing(Outcome::HopLimit));
            }
            *hops_left -= 1;
            visited.insert(server);

            let response = self.ask(server, &query)?;
            let code = response.header.response_code;
            if code != ResponseCode::NoError {
                debug!(%server, ?code, "server returned an error");
                return Ok(Resolution::nothing(Outcome::ServerError(code)));
            }
            if !response.answer.is_empty() {
                debug!(%server, records = response.answer.len(), "got answer");
                return Ok(Resolution {
                    records: response.answer,
                    outcome: Outcome::Answered,
                });
            }
            match self.follow_referral(&response, &visited, hops_left) {
                Referral::Follow(next) => server = next,
                Referral::Stop(outcome) => return Ok(Resolution::nothing(outcome)),
            }
        }
    }

    fn ask(&mut self, server: Ipv4Addr, query: &[u8]) -> Result<Message, ResolveError> {
        debug!(%server, "sending query");
        let bytes = self
            .transport
            .exchange(server, query)
            .map_err(|source| ResolveError::Transport { server, source })?;
        let response =
            Message::decode(&bytes).map_err(|source| ResolveError::Decode { server, source })?;
        if response.header.id != QUERY_ID {
            warn!(
                sent = QUERY_ID,
                received = response.header.id,
                "mismatch between query IDs"
            );
        }
        Ok(response)
    }

    /// Find the next server to ask from the NS records of a response without answers.
    /// Nameservers are tried in order; the first one with a usable address wins.
    fn follow_referral(
        &mut self,
        referral: &Message,
        visited: &HashSet<Ipv4Addr>,
        hops_left: &mut usize,
    ) -> Referral {
        // Glue records. Names compare case-insensitively.
        let mut glue = HashMap::new();
        for record in &referral.additional {
            if let RecordData::A(ip) = record.data {
                glue.entry(record.name.to_ascii_lowercase()).or_insert(ip);
            }
        }

        let nameservers = referral.authority.iter().filter_map(|r| match &r.data {
            RecordData::Ns(name) => Some(name.as_str()),
            _ => None,
        });
        for ns in nameservers {
            let address = match glue.get(&ns.to_ascii_lowercase()) {
                Some(&ip) => Some(ip),
                None => match self.lookup_nameserver(ns, hops_left) {
                    Ok(ip) => ip,
                    Err(outcome) => return Referral::Stop(outcome),
                },
            };
            match address {
                Some(ip) if visited.contains(&ip) => {
                    warn!(ns, %ip, "referred back to a server already asked, skipping")
                }
                Some(ip) => {
                    debug!(ns, %ip, "following referral");
                    return Referral::Follow(ip);
                }
                None => debug!(ns, "no address for nameserver"),
            }
        }
        Referral::Stop(Outcome::DeadEnd)
    }

    /// Resolve a glueless nameserver's address from scratch. Failures just mean this
    /// nameserver is no use, except for running out of hops, which ends everything.
    fn lookup_nameserver(
        &mut self,
        ns: &str,
        hops_left: &mut usize,
    ) -> Result<Option<Ipv4Addr>, Outcome> {
        debug!(ns, "no glue, resolving nameserver address");
        match self.resolve_within(&Request::new(ns), hops_left) {
            Ok(Resolution {
                outcome: Outcome::HopLimit,
                ..
            }) => Err(Outcome::HopLimit),
            Ok(resolution) => Ok(first_address(&resolution.records)),
            Err(e) => {
                warn!(ns, error = %e, "could not resolve nameserver");
                Ok(None)
            }
        }
    }
}

fn first_address(records: &[Record]) -> Option<Ipv4Addr> {
    records.iter().find_map(|r| match r.data {
        RecordData::A(ip) => Some(ip),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{a, cname, ns, ResponseBuilder};
    use std::io;

    /// Answers queries from a closure and remembers who was asked what.
    struct Scripted<F> {
        respond: F,
        asked: Vec<(Ipv4Addr, String)>,
    }

    impl<F> Transport for Scripted<F>
    where
        F: FnMut(Ipv4Addr, &Question) -> io::Result<Vec<u8>>,
    {
        fn exchange(&mut self, server: Ipv4Addr, query: &[u8]) -> io::Result<Vec<u8>> {
            let query = Message::decode(query).unwrap();
            assert!(!query.header.recursion_desired);
            let question = &query.question[0];
            self.asked.push((server, question.name.clone()));
            (self.respond)(server, question)
        }
    }

    fn resolver<F>(respond: F, max_hops: usize) -> Resolver<Scripted<F>>
    where
        F: FnMut(Ipv4Addr, &Question) -> io::Result<Vec<u8>>,
    {
        Resolver::new(
            Scripted {
                respond,
                asked: Vec::new(),
            },
            ResolverConfig { max_hops },
        )
    }

    fn is_root(ip: Ipv4Addr) -> bool {
        ROOT_SERVERS.iter().any(|root| root.address == ip)
    }

    fn reply(q: &Question) -> ResponseBuilder {
        ResponseBuilder::new(QUERY_ID, &q.name, q.record_type)
    }

    const GLUE: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 53);
    const WWW: Ipv4Addr = Ipv4Addr::new(93, 184, 216, 34);

    #[test]
    fn test_referral_with_glue() {
        let mut r = resolver(
            |server, q| {
                let msg = if is_root(server) {
                    reply(q)
                        .authority(ns("example.com", "ns1.example.com"))
                        .additional(a("ns1.example.com", GLUE))
                } else {
                    assert_eq!(server, GLUE);
                    reply(q).answer(a("www.example.com", WWW))
                };
                Ok(msg.build())
            },
            20,
        );
        let resolution = r.resolve(&Request::new("www.example.com")).unwrap();
        assert_eq!(resolution.outcome, Outcome::Answered);
        assert_eq!(resolution.records[0].data, RecordData::A(WWW));

        let asked = &r.transport.asked;
        assert_eq!(asked.len(), 2);
        assert!(is_root(asked[0].0));
        assert_eq!(asked[1], (GLUE, "www.example.com".to_owned()));
    }

    #[test]
    fn test_referral_without_glue() {
        let mut r = resolver(
            |server, q| {
                let msg = match (is_root(server), q.name.as_str()) {
                    (true, "www.example.com") => {
                        reply(q).authority(ns("example.com", "ns1.example.com"))
                    }
                    (true, "ns1.example.com") => {
                        assert_eq!(q.record_type, RecordType::A);
                        reply(q).answer(a("ns1.example.com", GLUE))
                    }
                    (false, "www.example.com") => {
                        assert_eq!(server, GLUE);
                        reply(q).answer(a("www.example.com", WWW))
                    }
                    other => panic!("unexpected query {other:?}"),
                };
                Ok(msg.build())
            },
            20,
        );
        let mut request = Request::new("www.example.com");
        request.record_type = RecordType::Aaaa;
        let records = r.resolve(&request).unwrap().into_records();
        assert_eq!(records.len(), 1);

        let asked = &r.transport.asked;
        assert_eq!(asked.len(), 3);
        assert_eq!(asked[1].1, "ns1.example.com");
        assert!(is_root(asked[1].0), "nested lookup must start at a root");
        assert_eq!(asked[2], (GLUE, "www.example.com".to_owned()));
    }

    #[test]
    fn test_nested_lookup_skips_non_address_records() {
        let mut r = resolver(
            |server, q| {
                let msg = match (is_root(server), q.name.as_str()) {
                    (true, "www.example.com") => {
                        reply(q).authority(ns("example.com", "ns1.example.com"))
                    }
                    (true, "ns1.example.com") => reply(q)
                        .answer(cname("ns1.example.com", "host.example.net"))
                        .answer(a("host.example.net", GLUE)),
                    (false, _) => reply(q).answer(a("www.example.com", WWW)),
                    other => panic!("unexpected query {other:?}"),
                };
                Ok(msg.build())
            },
            20,
        );
        let resolution = r.resolve(&Request::new("www.example.com")).unwrap();
        assert_eq!(resolution.outcome, Outcome::Answered);
        assert_eq!(r.transport.asked[2].0, GLUE);
    }

    #[test]
    fn test_error_code_comes_before_sections() {
        let mut r = resolver(
            |_, q| {
                Ok(reply(q)
                    .rcode(3)
                    .answer(a("www.example.com", WWW))
                    .authority(ns("example.com", "ns1.example.com"))
                    .additional(a("ns1.example.com", GLUE))
                    .build())
            },
            20,
        );
        let resolution = r.resolve(&Request::new("www.example.com")).unwrap();
        assert!(resolution.is_empty());
        assert_eq!(
            resolution.outcome,
            Outcome::ServerError(ResponseCode::NameError)
        );
        assert_eq!(r.transport.asked.len(), 1);
    }

    #[test]
    fn test_falls_through_to_next_nameserver() {
        let mut r = resolver(
            |server, q| {
                let msg = match (is_root(server), q.name.as_str()) {
                    (true, "www.example.com") => reply(q)
                        .authority(ns("example.com", "broken.example.org"))
                        .authority(ns("example.com", "NS2.example.com"))
                        .additional(a("ns2.example.com", GLUE)),
                    (true, "broken.example.org") => reply(q).rcode(3),
                    (false, _) => reply(q).answer(a("www.example.com", WWW)),
                    other => panic!("unexpected query {other:?}"),
                };
                Ok(msg.build())
            },
            20,
        );
        let resolution = r.resolve(&Request::new("www.example.com")).unwrap();
        assert_eq!(resolution.outcome, Outcome::Answered);
        let asked = &r.transport.asked;
        assert_eq!(asked[1].1, "broken.example.org");
        assert_eq!(asked[2].0, GLUE);
    }

    #[test]
    fn test_referral_without_nameservers_is_a_dead_end() {
        let mut r = resolver(|_, q| Ok(reply(q).build()), 20);
        let resolution = r.resolve(&Request::new("www.example.com")).unwrap();
        assert_eq!(resolution, Resolution::nothing(Outcome::DeadEnd));
    }

    #[test]
    fn test_cycle_between_servers_stops() {
        let first = Ipv4Addr::new(10, 0, 0, 1);
        let second = Ipv4Addr::new(10, 0, 0, 2);
        let mut r = resolver(
            move |server, q| {
                let next = if server == first { second } else { first };
                Ok(reply(q)
                    .authority(ns("example.com", "ns.example.com"))
                    .additional(a("ns.example.com", next))
                    .build())
            },
            20,
        );
        let resolution = r.resolve(&Request::new("www.example.com")).unwrap();
        assert_eq!(resolution.outcome, Outcome::DeadEnd);
        let servers: Vec<_> = r.transport.asked.iter().map(|(ip, _)| *ip).collect();
        assert_eq!(servers.len(), 3);
        assert_eq!(&servers[1..], &[first, second]);
    }

    #[test]
    fn test_endless_referrals_hit_the_hop_limit() {
        let mut r = resolver(
            |server, q| {
                let next = Ipv4Addr::from(u32::from(server).wrapping_add(1));
                Ok(reply(q)
                    .authority(ns("example.com", "ns.example.com"))
                    .additional(a("ns.example.com", next))
                    .build())
            },
            5,
        );
        let resolution = r.resolve(&Request::new("www.example.com")).unwrap();
        assert_eq!(resolution.outcome, Outcome::HopLimit);
        assert_eq!(r.transport.asked.len(), 5);
    }

    #[test]
    fn test_glueless_loop_hits_the_hop_limit() {
        // Finding ns.loop.test's address needs ns.loop.test's address.
        let mut r = resolver(
            |_, q| {
                Ok(reply(q)
                    .authority(ns("loop.test", "ns.loop.test"))
                    .build())
            },
            6,
        );
        let resolution = r.resolve(&Request::new("www.loop.test")).unwrap();
        assert_eq!(resolution.outcome, Outcome::HopLimit);
        assert_eq!(r.transport.asked.len(), 6);
    }

    #[test]
    fn test_server_override_is_asked_first() {
        let chosen = Ipv4Addr::new(10, 9, 8, 7);
        let mut r = resolver(
            |_, q| Ok(reply(q).answer(a(&q.name, WWW)).build()),
            20,
        );
        let mut request = Request::new("example.com");
        request.server = Some(ServerOverride::Address(chosen));
        r.resolve(&request).unwrap();
        assert_eq!(r.transport.asked[0].0, chosen);
    }

    #[test]
    fn test_transport_failure_propagates() {
        let mut r = resolver(
            |_, _| Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused")),
            20,
        );
        let err = r.resolve(&Request::new("example.com")).unwrap_err();
        match err {
            ResolveError::Transport { server, .. } => assert!(is_root(server)),
            other => panic!("expected a transport error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_response_propagates() {
        let mut r = resolver(|_, _| Ok(vec![0, 1, 2]), 20);
        let err = r.resolve(&Request::new("example.com")).unwrap_err();
        assert!(matches!(err, ResolveError::Decode { .. }));
    }

    #[test]
    fn test_parse_server_override() {
        assert_eq!(
            "k".parse::<ServerOverride>().unwrap(),
            ServerOverride::Root(&ROOT_SERVERS[10])
        );
        assert_eq!(
            " M ".parse::<ServerOverride>().unwrap().address(),
            Ipv4Addr::new(202, 12, 27, 33)
        );
        assert_eq!(
            "8.8.8.8".parse::<ServerOverride>().unwrap(),
            ServerOverride::Address(Ipv4Addr::new(8, 8, 8, 8))
        );
        assert!(matches!(
            "z".parse::<ServerOverride>(),
            Err(ArgError::UnknownRootServer(_))
        ));
        assert!(matches!(
            "1.2.3".parse::<ServerOverride>(),
            Err(ArgError::BadIpv4(_))
        ));
    }

    #[test]
    fn test_display_server_override() {
        let root = "a".parse::<ServerOverride>().unwrap();
        assert_eq!(root.to_string(), "a.root-servers.net (198.41.0.4)");
        let ip = ServerOverride::Address(Ipv4Addr::new(192, 0, 2, 1));
        assert_eq!(ip.to_string(), "192.0.2.1");
    }
}
