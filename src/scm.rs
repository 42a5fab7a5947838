//! Git revisions recorded on a build.
//!
//! Git plugin versions record the built revision in two places on a build action: directly as
//! `lastBuiltRevision`, or nested as `build/revision`. Both the `BuildData` and the older
//! `BuildDetails` action classes serialize as `<action>`, so every action is scanned regardless
//! of its class. Each action is resolved to one [`RevisionShape`], normalized to one
//! [`GenericGitRevision`] per named branch and de-duplicated in encounter order.

use crate::GenericGitRevision;
use serde::Deserialize;

/// Actions of a build as served by `.../<n>/api/xml?tree=actions[...]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScmActions {
    #[serde(rename = "action", default)]
    pub actions: Vec<ScmAction>,
}

/// One build action; non-SCM actions deserialize with every field empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScmAction {
    /// `remoteUrls` entries are serialized as repeated `<remoteUrl>` elements.
    #[serde(rename = "remoteUrl", default)]
    pub remote_urls: Vec<String>,
    #[serde(rename = "lastBuiltRevision", default)]
    pub last_built_revision: Option<Revision>,
    #[serde(default)]
    pub build: Option<NestedBuild>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NestedBuild {
    #[serde(default)]
    pub revision: Option<Revision>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Revision {
    #[serde(rename = "SHA1", default)]
    pub sha1: Option<String>,
    #[serde(rename = "branch", default)]
    pub branches: Vec<Branch>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Branch {
    #[serde(rename = "SHA1", default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Where an action keeps its revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionShape<'a> {
    /// `action/lastBuiltRevision`
    Direct(&'a Revision),
    /// `action/build/revision`
    NestedBuild(&'a Revision),
}

impl<'a> RevisionShape<'a> {
    fn revision(self) -> &'a Revision {
        match self {
            Self::Direct(r) | Self::NestedBuild(r) => r,
        }
    }
}

impl ScmAction {
    /// First shape carrying a named branch, tried in fixed order.
    #[must_use]
    pub fn shape(&self) -> Option<RevisionShape<'_>> {
        let direct = self.last_built_revision.as_ref().map(RevisionShape::Direct);
        let nested = self
            .build
            .as_ref()
            .and_then(|b| b.revision.as_ref())
            .map(RevisionShape::NestedBuild);
        [direct, nested]
            .into_iter()
            .flatten()
            .find(|shape| named_branches(shape.revision()).next().is_some())
    }

    #[must_use]
    pub fn remote_url(&self) -> Option<&str> {
        self.remote_urls
            .iter()
            .map(|u| u.trim())
            .find(|u| !u.is_empty())
    }

    /// Normalized revisions of this action, one per named branch of its revision.
    ///
    /// A commit built on several branches yields one entry per branch, in document order;
    /// unnamed branches are skipped.
    #[must_use]
    pub fn git_revisions(&self) -> Vec<GenericGitRevision> {
        let Some(shape) = self.shape() else {
            return Vec::new();
        };
        let revision = shape.revision();
        named_branches(revision)
            .filter_map(|branch| {
                let name = branch.name.as_deref()?.trim();
                let sha1 = branch
                    .sha1
                    .as_deref()
                    .or(revision.sha1.as_deref())
                    .unwrap_or_default()
                    .trim();
                Some(GenericGitRevision {
                    name: name.to_owned(),
                    branch: branch_from_ref(name).to_owned(),
                    sha1: sha1.to_owned(),
                    remote_url: self.remote_url().map(ToOwned::to_owned),
                })
            })
            .collect()
    }
}

fn named_branches(revision: &Revision) -> impl Iterator<Item = &Branch> {
    revision
        .branches
        .iter()
        .filter(|b| b.name.as_deref().is_some_and(|n| !n.trim().is_empty()))
}

/// Strip `refs/remotes/<remote>/` or `refs/heads/`; other names are returned unchanged.
#[must_use]
pub fn branch_from_ref(name: &str) -> &str {
    if let Some(rest) = name.strip_prefix("refs/remotes/")
        && let Some((_, branch)) = rest.split_once('/')
        && !branch.is_empty()
    {
        return branch;
    }
    match name.strip_prefix("refs/heads/") {
        Some(branch) if !branch.is_empty() => branch,
        _ => name,
    }
}

/// De-duplicated revisions of `actions`, in order of first occurrence.
#[must_use]
pub fn extract_revisions(actions: &ScmActions) -> Vec<GenericGitRevision> {
    let mut revisions: Vec<GenericGitRevision> = Vec::new();
    for revision in actions.actions.iter().flat_map(ScmAction::git_revisions) {
        if !revisions.contains(&revision) {
            revisions.push(revision);
        }
    }
    revisions
}

/// Parse the XML action list of a build.
pub fn parse_actions(xml: &[u8]) -> Result<ScmActions, serde_xml_rs::Error> {
    serde_xml_rs::from_reader(xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REMOTE: &str = "https://git.example.com/app.git";

    fn direct(name: &str, sha1: &str) -> ScmAction {
        ScmAction {
            remote_urls: vec![REMOTE.to_owned()],
            last_built_revision: Some(Revision {
                sha1: Some(sha1.to_owned()),
                branches: vec![Branch {
                    sha1: Some(sha1.to_owned()),
                    name: Some(name.to_owned()),
                }],
            }),
            build: None,
        }
    }

    fn nested(name: &str, sha1: &str) -> ScmAction {
        ScmAction {
            remote_urls: vec![REMOTE.to_owned()],
            last_built_revision: None,
            build: Some(NestedBuild {
                revision: Some(Revision {
                    sha1: None,
                    branches: vec![Branch {
                        sha1: Some(sha1.to_owned()),
                        name: Some(name.to_owned()),
                    }],
                }),
            }),
        }
    }

    #[test]
    fn branch_strips_known_prefixes() {
        assert_eq!(branch_from_ref("refs/remotes/origin/master"), "master");
        assert_eq!(branch_from_ref("refs/remotes/upstream/feature/x"), "feature/x");
        assert_eq!(branch_from_ref("refs/heads/release"), "release");
        assert_eq!(branch_from_ref("origin/master"), "origin/master");
        assert_eq!(branch_from_ref("refs/tags/v1"), "refs/tags/v1");
    }

    #[test]
    fn identical_revision_in_both_shapes_is_kept_once() {
        let actions = ScmActions {
            actions: vec![
                direct("refs/remotes/origin/master", "abc"),
                ScmAction::default(),
                nested("refs/remotes/origin/master", "abc"),
            ],
        };
        let revisions = extract_revisions(&actions);
        assert_eq!(revisions.len(), 1);
        assert_eq!(revisions[0].branch, "master");
        assert_eq!(revisions[0].remote_url.as_deref(), Some(REMOTE));
    }

    #[test]
    fn differing_sha1_keeps_encounter_order() {
        let actions = ScmActions {
            actions: vec![
                nested("refs/remotes/origin/master", "222"),
                direct("refs/remotes/origin/master", "111"),
            ],
        };
        let shas: Vec<String> = extract_revisions(&actions)
            .into_iter()
            .map(|r| r.sha1)
            .collect();
        assert_eq!(shas, ["222", "111"]);
    }

    #[test]
    fn direct_shape_wins_over_nested() {
        let mut action = direct("refs/heads/main", "aaa");
        action.build = nested("refs/heads/other", "bbb").build;
        assert!(matches!(action.shape(), Some(RevisionShape::Direct(_))));
        assert_eq!(action.git_revisions()[0].sha1, "aaa");
    }

    #[test]
    fn every_named_branch_of_a_revision_is_kept() {
        let mut action = direct("refs/remotes/origin/main", "abc");
        if let Some(revision) = action.last_built_revision.as_mut() {
            revision.branches.push(Branch {
                sha1: None,
                name: Some("refs/remotes/origin/release".to_owned()),
            });
            revision.branches.push(Branch {
                sha1: Some("abc".to_owned()),
                name: None,
            });
        }
        let actions = ScmActions {
            actions: vec![action, direct("refs/remotes/origin/main", "abc")],
        };

        let revisions = extract_revisions(&actions);
        let branches: Vec<&str> = revisions.iter().map(|r| r.branch.as_str()).collect();
        assert_eq!(branches, ["main", "release"]);
        assert_eq!(revisions[1].sha1, "abc");
    }

    #[test]
    fn no_scm_data_yields_empty_list() {
        assert!(extract_revisions(&ScmActions::default()).is_empty());
    }

    #[test]
    fn parses_build_action_xml() {
        let xml = br#"<freeStyleBuild _class="hudson.model.FreeStyleBuild">
  <action _class="hudson.model.CauseAction"></action>
  <action _class="hudson.plugins.git.util.BuildData">
    <lastBuiltRevision>
      <SHA1>943a702d06f34599aee1f8da8ef9f7296031d699</SHA1>
      <branch>
        <SHA1>943a702d06f34599aee1f8da8ef9f7296031d699</SHA1>
        <name>refs/remotes/origin/master</name>
      </branch>
    </lastBuiltRevision>
    <remoteUrl>https://git.example.com/platform/deployer.git</remoteUrl>
  </action>
  <action _class="hudson.plugins.git.util.BuildDetails">
    <build>
      <revision>
        <branch>
          <SHA1>943a702d06f34599aee1f8da8ef9f7296031d699</SHA1>
          <name>refs/remotes/origin/master</name>
        </branch>
      </revision>
    </build>
    <remoteUrl>https://git.example.com/platform/deployer.git</remoteUrl>
  </action>
</freeStyleBuild>"#;

        let actions = parse_actions(xml).unwrap();
        assert_eq!(actions.actions.len(), 3);

        let revisions = extract_revisions(&actions);
        assert_eq!(
            revisions,
            vec![GenericGitRevision {
                name: "refs/remotes/origin/master".to_owned(),
                branch: "master".to_owned(),
                sha1: "943a702d06f34599aee1f8da8ef9f7296031d699".to_owned(),
                remote_url: Some("https://git.example.com/platform/deployer.git".to_owned()),
            }]
        );
    }
}
